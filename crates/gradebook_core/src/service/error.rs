//! Service-level error taxonomy.
//!
//! Every failure a gradebook operation can surface collapses into one of
//! five kinds with a stable machine code.

use crate::model::{ResourceKind, ValidationErrors};
use crate::repo::RepoError;
use crate::scope::ScopeDenied;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type GradebookResult<T> = Result<T, GradebookError>;

/// Machine-stable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    DuplicateResource,
    ValidationFailed,
    Forbidden,
    Unexpected,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::DuplicateResource => "duplicate_resource",
            Self::ValidationFailed => "validation_failed",
            Self::Forbidden => "forbidden",
            Self::Unexpected => "unexpected",
        }
    }
}

#[derive(Debug)]
pub enum GradebookError {
    /// A direct or referenced `sourcedId` does not resolve.
    NotFound {
        kind: ResourceKind,
        sourced_id: String,
    },
    /// Create with an explicit `sourcedId` that is already taken.
    DuplicateResource {
        kind: ResourceKind,
        sourced_id: String,
    },
    ValidationFailed(ValidationErrors),
    Forbidden(ScopeDenied),
    /// Internal failure. The detail is for logs, never for callers.
    Unexpected(RepoError),
}

impl GradebookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::DuplicateResource { .. } => ErrorKind::DuplicateResource,
            Self::ValidationFailed(_) => ErrorKind::ValidationFailed,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::Unexpected(_) => ErrorKind::Unexpected,
        }
    }

    pub(crate) fn not_found(kind: ResourceKind, sourced_id: &str) -> Self {
        Self::NotFound {
            kind,
            sourced_id: sourced_id.to_string(),
        }
    }

    /// Field map for validation failures; `None` for every other kind.
    pub fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::ValidationFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

impl Display for GradebookError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, sourced_id } => write!(f, "{kind} not found: {sourced_id}"),
            Self::DuplicateResource { kind, sourced_id } => {
                write!(f, "{kind} with sourcedId already exists: {sourced_id}")
            }
            Self::ValidationFailed(errors) => write!(f, "{errors}"),
            Self::Forbidden(denied) => write!(f, "{denied}"),
            Self::Unexpected(err) => write!(f, "unexpected gradebook failure: {err}"),
        }
    }
}

impl Error for GradebookError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::ValidationFailed(err) => Some(err),
            Self::Forbidden(err) => Some(err),
            Self::Unexpected(err) => Some(err),
            Self::NotFound { .. } | Self::DuplicateResource { .. } => None,
        }
    }
}

impl From<RepoError> for GradebookError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, sourced_id } => Self::NotFound { kind, sourced_id },
            RepoError::Duplicate { kind, sourced_id } => {
                Self::DuplicateResource { kind, sourced_id }
            }
            RepoError::Validation(errors) => Self::ValidationFailed(errors),
            other => Self::Unexpected(other),
        }
    }
}

impl From<ValidationErrors> for GradebookError {
    fn from(value: ValidationErrors) -> Self {
        Self::ValidationFailed(value)
    }
}

impl From<ScopeDenied> for GradebookError {
    fn from(value: ScopeDenied) -> Self {
        Self::Forbidden(value)
    }
}
