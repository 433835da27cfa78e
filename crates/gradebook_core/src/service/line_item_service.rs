//! Line item use-cases.
//!
//! The category reference is optional. When a payload names one, it must
//! resolve before anything is written.

use crate::model::{
    merge, Category, GradebookEntity, LineItem, LineItemPayload, PayloadIntent,
};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::{EntityRepository, GradebookStore};
use crate::scope::{Action, ScopeSet};
use crate::service::identity::assign_or_validate_id;
use crate::service::references::{resolve_optional, resolve_reference};
use crate::service::{read_back, GradebookResult, GradebookService};
use log::info;

impl<S: GradebookStore> GradebookService<S> {
    pub fn list_line_items(
        &self,
        scopes: &ScopeSet,
        query: &ListQuery<LineItem>,
    ) -> GradebookResult<Page<LineItem>> {
        self.list_entities(scopes, query)
    }

    /// Line items whose `categorySourcedId` equals `category_sourced_id`.
    ///
    /// An unknown category yields an empty page.
    pub fn list_line_items_for_category(
        &self,
        scopes: &ScopeSet,
        category_sourced_id: &str,
        query: &ListQuery<LineItem>,
    ) -> GradebookResult<Page<LineItem>> {
        scopes.authorize(LineItem::KIND, Action::List)?;
        Ok(self
            .store
            .list_line_items_for_category(category_sourced_id, query)?)
    }

    pub fn get_line_item(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<LineItem> {
        self.get_entity(scopes, sourced_id)
    }

    pub fn create_line_item(
        &self,
        scopes: &ScopeSet,
        payload: &LineItemPayload,
    ) -> GradebookResult<LineItem> {
        scopes.authorize(LineItem::KIND, Action::Create)?;
        let created = self.store.in_transaction(|store| -> GradebookResult<LineItem> {
            payload.validate(PayloadIntent::Create)?;
            let sourced_id =
                assign_or_validate_id::<LineItem, S>(store, payload.sourced_id.as_deref())?;
            let category: Option<Category> =
                resolve_optional(store, payload.category_sourced_id.as_deref())?;
            let line_item = LineItem::create(
                sourced_id,
                payload,
                category.map(|category| category.base.sourced_id),
            )?;
            EntityRepository::<LineItem>::insert(store, &line_item)?;
            read_back::<LineItem, S>(store, &line_item.base.sourced_id)
        })?;
        info!(
            "event=line_item_create module=service status=ok sourced_id={} category_linked={}",
            created.base.sourced_id,
            created.category_sourced_id.is_some()
        );
        Ok(created)
    }

    /// Sparse update. A non-empty `categorySourcedId` re-points the line item;
    /// absent or empty leaves the current reference in place.
    pub fn update_line_item(
        &self,
        scopes: &ScopeSet,
        sourced_id: &str,
        payload: &LineItemPayload,
    ) -> GradebookResult<LineItem> {
        scopes.authorize(LineItem::KIND, Action::Update)?;
        let updated = self.store.in_transaction(|store| -> GradebookResult<LineItem> {
            payload.validate(PayloadIntent::Update)?;
            let mut staged: LineItem = resolve_reference(store, sourced_id)?;
            let category: Option<Category> =
                resolve_optional(store, payload.category_sourced_id.as_deref())?;
            if let Some(category) = category {
                staged.category_sourced_id = Some(category.base.sourced_id);
            }
            let merged = merge(&staged, payload)?;
            EntityRepository::<LineItem>::update(store, &merged)?;
            read_back::<LineItem, S>(store, sourced_id)
        })?;
        info!("event=line_item_update module=service status=ok sourced_id={sourced_id}");
        Ok(updated)
    }

    /// Soft-deletes the line item. Its results are left as they are.
    pub fn delete_line_item(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<()> {
        self.delete_entity::<LineItem>(scopes, sourced_id)
    }
}
