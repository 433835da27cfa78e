//! Category use-cases.

use crate::model::{merge, Category, CategoryPayload, GradebookEntity, PayloadIntent};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::{EntityRepository, GradebookStore};
use crate::scope::{Action, ScopeSet};
use crate::service::identity::assign_or_validate_id;
use crate::service::references::resolve_reference;
use crate::service::{read_back, GradebookResult, GradebookService};
use log::info;

impl<S: GradebookStore> GradebookService<S> {
    pub fn list_categories(
        &self,
        scopes: &ScopeSet,
        query: &ListQuery<Category>,
    ) -> GradebookResult<Page<Category>> {
        self.list_entities(scopes, query)
    }

    pub fn get_category(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<Category> {
        self.get_entity(scopes, sourced_id)
    }

    /// Creates a category, assigning a `sourcedId` when the payload has none.
    pub fn create_category(
        &self,
        scopes: &ScopeSet,
        payload: &CategoryPayload,
    ) -> GradebookResult<Category> {
        scopes.authorize(Category::KIND, Action::Create)?;
        let created = self.store.in_transaction(|store| -> GradebookResult<Category> {
            payload.validate(PayloadIntent::Create)?;
            let sourced_id =
                assign_or_validate_id::<Category, S>(store, payload.sourced_id.as_deref())?;
            let category = Category::create(sourced_id, payload)?;
            EntityRepository::<Category>::insert(store, &category)?;
            read_back::<Category, S>(store, &category.base.sourced_id)
        })?;
        info!(
            "event=category_create module=service status=ok sourced_id={}",
            created.base.sourced_id
        );
        Ok(created)
    }

    /// Overlays the fields present in `payload` onto the stored category.
    pub fn update_category(
        &self,
        scopes: &ScopeSet,
        sourced_id: &str,
        payload: &CategoryPayload,
    ) -> GradebookResult<Category> {
        scopes.authorize(Category::KIND, Action::Update)?;
        let updated = self.store.in_transaction(|store| -> GradebookResult<Category> {
            payload.validate(PayloadIntent::Update)?;
            let existing: Category = resolve_reference(store, sourced_id)?;
            let merged = merge(&existing, payload)?;
            EntityRepository::<Category>::update(store, &merged)?;
            read_back::<Category, S>(store, sourced_id)
        })?;
        info!("event=category_update module=service status=ok sourced_id={sourced_id}");
        Ok(updated)
    }

    /// Soft-deletes the category. Its line items are left as they are.
    pub fn delete_category(&self, scopes: &ScopeSet, sourced_id: &str) -> GradebookResult<()> {
        self.delete_entity::<Category>(scopes, sourced_id)
    }
}
