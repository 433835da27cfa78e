//! Sparse-update overlay.
//!
//! A patch overwrites only the fields it carries. Reference fields are not
//! part of the overlay: callers resolve them first and stage them on the
//! record handed to [`merge`].

use crate::model::base::GradebookEntity;
use crate::model::validation::ValidationErrors;

/// Scalar overlay of a sparse payload onto an existing record.
pub trait Patch<E: GradebookEntity> {
    /// Copies every present field onto `target`; absent fields stay as-is.
    fn overlay(&self, target: &mut E);
}

/// Produces the merged record without mutating `existing`.
///
/// The merged record is validated as a whole and stamped with a fresh
/// `dateLastModified`. On error `existing` is untouched and nothing is
/// returned to persist.
pub fn merge<E, P>(existing: &E, patch: &P) -> Result<E, ValidationErrors>
where
    E: GradebookEntity,
    P: Patch<E>,
{
    let mut merged = existing.clone();
    patch.overlay(&mut merged);
    merged.validate()?;
    merged.base_mut().touch();
    Ok(merged)
}
