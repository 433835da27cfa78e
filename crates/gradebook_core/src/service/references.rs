//! Cross-entity reference resolution.
//!
//! Children store the parent's `sourcedId`; resolution is a lookup through
//! the store. Soft-deleted parents still resolve.

use crate::model::{GradebookEntity, ValidationErrors};
use crate::repo::EntityRepository;
use crate::service::error::{GradebookError, GradebookResult};

/// Loads the record of kind `E` named by `sourced_id`.
pub(crate) fn resolve_reference<E, S>(store: &S, sourced_id: &str) -> GradebookResult<E>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    store
        .find(sourced_id)?
        .ok_or_else(|| GradebookError::not_found(E::KIND, sourced_id))
}

/// Resolves an optional reference. Absent or empty means "no reference".
pub(crate) fn resolve_optional<E, S>(store: &S, candidate: Option<&str>) -> GradebookResult<Option<E>>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    match candidate {
        None | Some("") => Ok(None),
        Some(sourced_id) => resolve_reference(store, sourced_id).map(Some),
    }
}

/// Resolves a mandatory reference. Absent or empty is a validation failure
/// on `field`; a non-empty id that does not resolve is `NotFound`.
pub(crate) fn resolve_required<E, S>(
    store: &S,
    candidate: Option<&str>,
    field: &str,
    message: &str,
) -> GradebookResult<E>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    match candidate {
        None | Some("") => Err(GradebookError::ValidationFailed(ValidationErrors::single(
            field, message,
        ))),
        Some(sourced_id) => resolve_reference(store, sourced_id),
    }
}
