//! Gradebook domain model.
//!
//! # Responsibility
//! - Define the three gradebook resources (`Category`, `LineItem`, `Result`)
//!   and the base attributes they share.
//! - Own field validation and the sparse-update overlay for each resource.
//!
//! # Invariants
//! - Every resource is identified by a stable `sourcedId`, unique per kind.
//! - Children reference parents by `sourcedId` only; parents never hold
//!   child objects.
//! - Deletion is a status transition (`active -> tobedeleted`), never a
//!   physical erase.

pub mod base;
pub mod category;
pub mod fields;
pub mod grade_result;
pub mod line_item;
pub mod merge;
pub mod validation;

pub use base::{EntityBase, GradebookEntity, ResourceKind, SourcedId, Status};
pub use category::{Category, CategoryPayload};
pub use fields::{FieldKind, FieldValue, QueryField};
pub use grade_result::{GradeResult, ResultPayload, ScoreStatus};
pub use line_item::{LineItem, LineItemPayload};
pub use merge::{merge, Patch};
pub use validation::{PayloadIntent, ValidationErrors};
