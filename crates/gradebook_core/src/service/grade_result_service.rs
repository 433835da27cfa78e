//! Result use-cases.
//!
//! Results always point at a line item. Writes need the gradebook scope,
//! not the core roster scope.

use crate::model::grade_result::LINE_ITEM_REQUIRED;
use crate::model::{merge, GradeResult, GradebookEntity, LineItem, PayloadIntent, ResultPayload};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::{EntityRepository, GradebookStore};
use crate::scope::{Action, ScopeSet};
use crate::service::identity::assign_or_validate_id;
use crate::service::references::{resolve_optional, resolve_reference, resolve_required};
use crate::service::{read_back, GradebookResult, GradebookService};
use log::info;

const LINE_ITEM_FIELD: &str = "lineItemSourcedId";

impl<S: GradebookStore> GradebookService<S> {
    pub fn list_results(
        &self,
        scopes: &ScopeSet,
        query: &ListQuery<GradeResult>,
    ) -> GradebookResult<Page<GradeResult>> {
        self.list_entities(scopes, query)
    }

    pub fn list_results_for_line_item(
        &self,
        scopes: &ScopeSet,
        line_item_sourced_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> GradebookResult<Page<GradeResult>> {
        scopes.authorize(GradeResult::KIND, Action::List)?;
        Ok(self
            .store
            .list_results_for_line_item(line_item_sourced_id, query)?)
    }

    pub fn list_results_for_student(
        &self,
        scopes: &ScopeSet,
        student_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> GradebookResult<Page<GradeResult>> {
        scopes.authorize(GradeResult::KIND, Action::List)?;
        Ok(self.store.list_results_for_student(student_id, query)?)
    }

    pub fn get_result(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<GradeResult> {
        self.get_entity(scopes, sourced_id)
    }

    pub fn create_result(
        &self,
        scopes: &ScopeSet,
        payload: &ResultPayload,
    ) -> GradebookResult<GradeResult> {
        scopes.authorize(GradeResult::KIND, Action::Create)?;
        let created = self
            .store
            .in_transaction(|store| -> GradebookResult<GradeResult> {
                payload.validate(PayloadIntent::Create)?;
                let sourced_id = assign_or_validate_id::<GradeResult, S>(
                    store,
                    payload.sourced_id.as_deref(),
                )?;
                let line_item: LineItem = resolve_required(
                    store,
                    payload.line_item_sourced_id.as_deref(),
                    LINE_ITEM_FIELD,
                    LINE_ITEM_REQUIRED,
                )?;
                let result = GradeResult::create(sourced_id, payload, line_item.base.sourced_id)?;
                EntityRepository::<GradeResult>::insert(store, &result)?;
                read_back::<GradeResult, S>(store, &result.base.sourced_id)
            })?;
        info!(
            "event=result_create module=service status=ok sourced_id={} line_item={}",
            created.base.sourced_id, created.line_item_sourced_id
        );
        Ok(created)
    }

    /// Sparse update. Omitted scores, status and comment keep their values.
    pub fn update_result(
        &self,
        scopes: &ScopeSet,
        sourced_id: &str,
        payload: &ResultPayload,
    ) -> GradebookResult<GradeResult> {
        scopes.authorize(GradeResult::KIND, Action::Update)?;
        let updated = self
            .store
            .in_transaction(|store| -> GradebookResult<GradeResult> {
                payload.validate(PayloadIntent::Update)?;
                let mut staged: GradeResult = resolve_reference(store, sourced_id)?;
                let line_item: Option<LineItem> =
                    resolve_optional(store, payload.line_item_sourced_id.as_deref())?;
                if let Some(line_item) = line_item {
                    staged.line_item_sourced_id = line_item.base.sourced_id;
                }
                let merged = merge(&staged, payload)?;
                EntityRepository::<GradeResult>::update(store, &merged)?;
                read_back::<GradeResult, S>(store, sourced_id)
            })?;
        info!("event=result_update module=service status=ok sourced_id={sourced_id}");
        Ok(updated)
    }

    pub fn delete_result(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<()> {
        self.delete_entity::<GradeResult>(scopes, sourced_id)
    }
}
