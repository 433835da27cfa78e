//! `sourcedId` assignment and uniqueness.
//!
//! # Invariants
//! - Absent or empty candidates get a fresh v4 UUID string.
//! - A whitespace-only candidate is a validation failure, never stored.
//! - An explicit id is accepted only when no record of the same kind holds it,
//!   including soft-deleted records.

use crate::model::{GradebookEntity, SourcedId, ValidationErrors};
use crate::repo::{EntityRepository, RepoError};
use crate::service::error::{GradebookError, GradebookResult};
use uuid::Uuid;

const SOURCED_ID_BLANK: &str = "Sourced ID must not be blank";
const MAX_GENERATION_ATTEMPTS: usize = 4;

/// Returns the id a new record of kind `E` will be stored under.
pub(crate) fn assign_or_validate_id<E, S>(
    store: &S,
    candidate: Option<&str>,
) -> GradebookResult<SourcedId>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    match candidate {
        None | Some("") => generate_unused_id::<E, S>(store),
        Some(candidate) if candidate.trim().is_empty() => Err(GradebookError::ValidationFailed(
            ValidationErrors::single("sourcedId", SOURCED_ID_BLANK),
        )),
        Some(candidate) => {
            if store.exists(candidate)? {
                return Err(GradebookError::DuplicateResource {
                    kind: E::KIND,
                    sourced_id: candidate.to_string(),
                });
            }
            Ok(candidate.to_string())
        }
    }
}

fn generate_unused_id<E, S>(store: &S) -> GradebookResult<SourcedId>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    for _ in 0..MAX_GENERATION_ATTEMPTS {
        let candidate = Uuid::new_v4().to_string();
        if !store.exists(&candidate)? {
            return Ok(candidate);
        }
    }
    Err(GradebookError::Unexpected(RepoError::InvalidData(format!(
        "no unused {} sourcedId after {MAX_GENERATION_ATTEMPTS} attempts",
        E::KIND
    ))))
}
