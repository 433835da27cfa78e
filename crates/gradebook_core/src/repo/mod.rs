//! Persistence capability consumed by the gradebook services.
//!
//! # Responsibility
//! - Define the per-resource lookup/exists/save/list contract.
//! - Provide a SQLite implementation and an in-memory implementation.
//!
//! # Invariants
//! - Write paths call `GradebookEntity::validate()` before persisting.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Listing order is the requested sort keys, then creation sequence.
//! - Lookups are by `sourcedId`; storage row keys never leave this module.

use crate::db::DbError;
use crate::model::{
    Category, GradeResult, GradebookEntity, LineItem, ResourceKind, ValidationErrors,
};
use crate::pagination::Page;
use crate::query::ListQuery;
use std::error::Error;
use std::fmt::{Display, Formatter};

mod category_repo;
mod grade_result_repo;
mod line_item_repo;
pub mod memory;
pub mod sqlite;

pub use memory::InMemoryGradebookStore;
pub use sqlite::SqliteGradebookStore;

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error for gradebook resources.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationErrors),
    Db(DbError),
    NotFound {
        kind: ResourceKind,
        sourced_id: String,
    },
    /// A record with the same `sourcedId` already exists for this kind.
    Duplicate {
        kind: ResourceKind,
        sourced_id: String,
    },
    InvalidData(String),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// An in-process lock was poisoned by a panicking writer.
    Poisoned(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, sourced_id } => write!(f, "{kind} not found: {sourced_id}"),
            Self::Duplicate { kind, sourced_id } => {
                write!(f, "{kind} with sourcedId already exists: {sourced_id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted gradebook data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "gradebook repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "gradebook repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "gradebook repository requires column `{column}` in table `{table}`"
            ),
            Self::Poisoned(what) => write!(f, "in-memory store lock poisoned: {what}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Lookup/save/list capability for one resource kind.
pub trait EntityRepository<E: GradebookEntity> {
    /// Loads one record by `sourcedId`, whatever its status.
    fn find(&self, sourced_id: &str) -> RepoResult<Option<E>>;
    fn exists(&self, sourced_id: &str) -> RepoResult<bool>;
    /// Persists a new record. Fails with `Duplicate` on an id collision.
    fn insert(&self, entity: &E) -> RepoResult<()>;
    /// Overwrites an existing record. Fails with `NotFound` when absent.
    fn update(&self, entity: &E) -> RepoResult<()>;
    /// Lists records of this kind matching `query`, no status filter.
    fn list(&self, query: &ListQuery<E>) -> RepoResult<Page<E>>;
}

/// Full persistence capability required by the gradebook services.
pub trait GradebookStore:
    EntityRepository<Category> + EntityRepository<LineItem> + EntityRepository<GradeResult>
{
    fn list_line_items_for_category(
        &self,
        category_sourced_id: &str,
        query: &ListQuery<LineItem>,
    ) -> RepoResult<Page<LineItem>>;

    fn list_results_for_line_item(
        &self,
        line_item_sourced_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> RepoResult<Page<GradeResult>>;

    fn list_results_for_student(
        &self,
        student_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> RepoResult<Page<GradeResult>>;

    /// Runs `f` as one unit: every write inside commits together, and an
    /// error leaves no partial write visible.
    fn in_transaction<T, Err, F>(&self, f: F) -> Result<T, Err>
    where
        F: FnOnce(&Self) -> Result<T, Err>,
        Err: From<RepoError>;
}
