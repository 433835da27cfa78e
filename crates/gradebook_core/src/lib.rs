//! Core domain logic for the OneRoster gradebook.
//! This crate is the single source of truth for gradebook invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod pagination;
pub mod query;
pub mod repo;
pub mod scope;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::{
    Category, CategoryPayload, FieldKind, FieldValue, GradeResult, GradebookEntity, LineItem,
    LineItemPayload, QueryField, ResourceKind, ResultPayload, ScoreStatus, Status,
    ValidationErrors,
};
pub use pagination::{Page, PageRequest};
pub use query::{Condition, FilterOp, ListQuery, SortKey};
pub use repo::{
    EntityRepository, GradebookStore, InMemoryGradebookStore, RepoError, RepoResult,
    SqliteGradebookStore,
};
pub use scope::{Scope, ScopeSet};
pub use service::{ErrorKind, GradebookError, GradebookResult, GradebookService};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
