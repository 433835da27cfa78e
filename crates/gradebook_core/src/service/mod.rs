//! Gradebook use-case services.
//!
//! # Responsibility
//! - Gate every operation on the caller's scope set.
//! - Run each write as one unit: identity, reference resolution, merge and
//!   save commit together or not at all.
//! - Keep transport layers decoupled from storage details.
//!
//! # Invariants
//! - Authorization is checked before any store access.
//! - Payload validation runs before identity assignment and resolution.
//! - Writes read the record back after saving and return the stored form.

mod category_service;
pub mod error;
mod grade_result_service;
mod identity;
mod lifecycle;
mod line_item_service;
mod references;

pub use error::{ErrorKind, GradebookError, GradebookResult};

use crate::model::GradebookEntity;
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::{EntityRepository, GradebookStore, RepoError};
use crate::scope::{Action, ScopeSet};
use lifecycle::soft_delete;
use log::info;
use references::resolve_reference;

/// Gradebook facade over one persistence capability.
pub struct GradebookService<S: GradebookStore> {
    store: S,
}

impl<S: GradebookStore> GradebookService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn get_entity<E>(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<E>
    where
        E: GradebookEntity,
        S: EntityRepository<E>,
    {
        scopes.authorize(E::KIND, Action::Get)?;
        resolve_reference(&self.store, sourced_id)
    }

    fn list_entities<E>(&self, scopes: &ScopeSet, query: &ListQuery<E>) -> GradebookResult<Page<E>>
    where
        E: GradebookEntity,
        S: EntityRepository<E>,
    {
        scopes.authorize(E::KIND, Action::List)?;
        Ok(EntityRepository::<E>::list(&self.store, query)?)
    }

    fn delete_entity<E>(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<()>
    where
        E: GradebookEntity,
        S: EntityRepository<E>,
    {
        scopes.authorize(E::KIND, Action::Delete)?;
        self.store
            .in_transaction(|store| soft_delete::<E, S>(store, sourced_id))?;
        info!(
            "event=delete module=service status=ok kind={} sourced_id={sourced_id}",
            E::KIND
        );
        Ok(())
    }
}

/// Loads the record just written, inside the same unit of work.
fn read_back<E, S>(store: &S, sourced_id: &str) -> GradebookResult<E>
where
    E: GradebookEntity,
    S: EntityRepository<E>,
{
    store.find(sourced_id)?.ok_or_else(|| {
        GradebookError::Unexpected(RepoError::InvalidData(format!(
            "{} `{sourced_id}` missing on read-back",
            E::KIND
        )))
    })
}
