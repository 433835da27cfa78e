//! OAuth scope contract for gradebook operations.
//!
//! The caller's scope set arrives already validated by an external token
//! authority. This module only maps operations to the scope they need and
//! checks exact membership.

use crate::model::ResourceKind;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Read access to every gradebook resource.
pub const SCOPE_ROSTER_READONLY: &str =
    "https://purl.imsglobal.org/spec/or/v1p2/scope/roster.readonly";
/// Write access to categories and line items.
pub const SCOPE_ROSTER_CORE_CREATEPUT: &str =
    "https://purl.imsglobal.org/spec/or/v1p2/scope/roster-core.createput";
/// Write access to results.
pub const SCOPE_GRADEBOOK_CREATEPUT: &str =
    "https://purl.imsglobal.org/spec/or/v1p2/scope/gradebook.createput";

/// Scope required by some gradebook operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope {
    RosterReadonly,
    RosterCoreCreatePut,
    GradebookCreatePut,
}

impl Scope {
    /// Exact scope URI presented by callers.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RosterReadonly => SCOPE_ROSTER_READONLY,
            Self::RosterCoreCreatePut => SCOPE_ROSTER_CORE_CREATEPUT,
            Self::GradebookCreatePut => SCOPE_GRADEBOOK_CREATEPUT,
        }
    }
}

/// Logical operation kinds exposed per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    List,
    Get,
    Create,
    Update,
    Delete,
}

impl Action {
    pub fn is_read(self) -> bool {
        matches!(self, Self::List | Self::Get)
    }
}

/// Maps one operation to the scope it requires.
pub fn required_scope(kind: ResourceKind, action: Action) -> Scope {
    if action.is_read() {
        return Scope::RosterReadonly;
    }
    match kind {
        ResourceKind::Category | ResourceKind::LineItem => Scope::RosterCoreCreatePut,
        ResourceKind::Result => Scope::GradebookCreatePut,
    }
}

/// Caller lacks the scope an operation requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeDenied {
    pub required: Scope,
}

impl Display for ScopeDenied {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "insufficient scope: requires {}", self.required.as_str())
    }
}

impl Error for ScopeDenied {}

/// Scope strings granted to one caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    granted: BTreeSet<String>,
}

impl ScopeSet {
    pub fn new<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            granted: scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses an OAuth `scope` claim (space-delimited).
    pub fn from_claim(claim: &str) -> Self {
        Self::new(claim.split_whitespace())
    }

    /// Every scope this service knows about.
    pub fn all() -> Self {
        Self::new([
            SCOPE_ROSTER_READONLY,
            SCOPE_ROSTER_CORE_CREATEPUT,
            SCOPE_GRADEBOOK_CREATEPUT,
        ])
    }

    pub fn contains(&self, scope: Scope) -> bool {
        self.granted.contains(scope.as_str())
    }

    pub fn require(&self, scope: Scope) -> Result<(), ScopeDenied> {
        if self.contains(scope) {
            Ok(())
        } else {
            Err(ScopeDenied { required: scope })
        }
    }

    /// Checks the scope needed for `action` on `kind`.
    pub fn authorize(&self, kind: ResourceKind, action: Action) -> Result<(), ScopeDenied> {
        self.require(required_scope(kind, action))
    }
}
