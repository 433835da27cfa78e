//! Soft-delete transition.
//!
//! `active -> tobedeleted` is the only move. Repeating it succeeds and only
//! re-stamps `dateLastModified`. Records are never erased and children are
//! left untouched.

use crate::model::GradebookEntity;
use crate::repo::EntityRepository;
use crate::service::error::GradebookResult;
use crate::service::references::resolve_reference;

/// Marks the record `tobedeleted` and persists it.
pub(crate) fn soft_delete<E, S>(store: &S, sourced_id: &str) -> GradebookResult<E>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    let mut entity: E = resolve_reference(store, sourced_id)?;
    entity.base_mut().mark_to_be_deleted();
    store.update(&entity)?;
    Ok(entity)
}
