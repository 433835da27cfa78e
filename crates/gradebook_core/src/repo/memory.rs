//! In-memory gradebook store for tests and embedding.
//!
//! Rows live in per-kind vectors so insertion order is creation order.
//! Transactions snapshot the tables and restore them when the unit fails.
//! Calling `in_transaction` from inside another one deadlocks.

use crate::model::{Category, GradeResult, GradebookEntity, LineItem};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::{EntityRepository, GradebookStore, RepoError, RepoResult};
use log::warn;
use std::sync::{Mutex, RwLock};

#[derive(Debug, Clone, Default)]
struct MemoryTables {
    categories: Vec<Category>,
    line_items: Vec<LineItem>,
    results: Vec<GradeResult>,
}

/// Thread-safe store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryGradebookStore {
    tables: RwLock<MemoryTables>,
    tx_lock: Mutex<()>,
}

impl InMemoryGradebookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryTables) -> T) -> RepoResult<T> {
        let tables = self
            .tables
            .read()
            .map_err(|_| RepoError::Poisoned("tables"))?;
        Ok(f(&tables))
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryTables) -> RepoResult<T>) -> RepoResult<T> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| RepoError::Poisoned("tables"))?;
        f(&mut tables)
    }
}

impl EntityRepository<Category> for InMemoryGradebookStore {
    fn find(&self, sourced_id: &str) -> RepoResult<Option<Category>> {
        self.read(|tables| find_row(&tables.categories, sourced_id))
    }

    fn exists(&self, sourced_id: &str) -> RepoResult<bool> {
        self.read(|tables| has_row(&tables.categories, sourced_id))
    }

    fn insert(&self, entity: &Category) -> RepoResult<()> {
        self.write(|tables| insert_row(&mut tables.categories, entity))
    }

    fn update(&self, entity: &Category) -> RepoResult<()> {
        self.write(|tables| update_row(&mut tables.categories, entity))
    }

    fn list(&self, query: &ListQuery<Category>) -> RepoResult<Page<Category>> {
        self.read(|tables| page_rows(&tables.categories, query, |_| true))
    }
}

impl EntityRepository<LineItem> for InMemoryGradebookStore {
    fn find(&self, sourced_id: &str) -> RepoResult<Option<LineItem>> {
        self.read(|tables| find_row(&tables.line_items, sourced_id))
    }

    fn exists(&self, sourced_id: &str) -> RepoResult<bool> {
        self.read(|tables| has_row(&tables.line_items, sourced_id))
    }

    fn insert(&self, entity: &LineItem) -> RepoResult<()> {
        self.write(|tables| insert_row(&mut tables.line_items, entity))
    }

    fn update(&self, entity: &LineItem) -> RepoResult<()> {
        self.write(|tables| update_row(&mut tables.line_items, entity))
    }

    fn list(&self, query: &ListQuery<LineItem>) -> RepoResult<Page<LineItem>> {
        self.read(|tables| page_rows(&tables.line_items, query, |_| true))
    }
}

impl EntityRepository<GradeResult> for InMemoryGradebookStore {
    fn find(&self, sourced_id: &str) -> RepoResult<Option<GradeResult>> {
        self.read(|tables| find_row(&tables.results, sourced_id))
    }

    fn exists(&self, sourced_id: &str) -> RepoResult<bool> {
        self.read(|tables| has_row(&tables.results, sourced_id))
    }

    fn insert(&self, entity: &GradeResult) -> RepoResult<()> {
        self.write(|tables| insert_row(&mut tables.results, entity))
    }

    fn update(&self, entity: &GradeResult) -> RepoResult<()> {
        self.write(|tables| update_row(&mut tables.results, entity))
    }

    fn list(&self, query: &ListQuery<GradeResult>) -> RepoResult<Page<GradeResult>> {
        self.read(|tables| page_rows(&tables.results, query, |_| true))
    }
}

impl GradebookStore for InMemoryGradebookStore {
    fn list_line_items_for_category(
        &self,
        category_sourced_id: &str,
        query: &ListQuery<LineItem>,
    ) -> RepoResult<Page<LineItem>> {
        self.read(|tables| {
            page_rows(&tables.line_items, query, |item| {
                item.category_sourced_id.as_deref() == Some(category_sourced_id)
            })
        })
    }

    fn list_results_for_line_item(
        &self,
        line_item_sourced_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> RepoResult<Page<GradeResult>> {
        self.read(|tables| {
            page_rows(&tables.results, query, |result| {
                result.line_item_sourced_id == line_item_sourced_id
            })
        })
    }

    fn list_results_for_student(
        &self,
        student_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> RepoResult<Page<GradeResult>> {
        self.read(|tables| {
            page_rows(&tables.results, query, |result| result.student_id == student_id)
        })
    }

    fn in_transaction<T, Err, F>(&self, f: F) -> Result<T, Err>
    where
        F: FnOnce(&Self) -> Result<T, Err>,
        Err: From<RepoError>,
    {
        let _guard = self
            .tx_lock
            .lock()
            .map_err(|_| RepoError::Poisoned("transaction"))?;
        let snapshot = self.read(MemoryTables::clone)?;

        match f(self) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.write(|tables| {
                    *tables = snapshot;
                    Ok(())
                })?;
                warn!("event=store_rollback module=repo status=ok store=memory");
                Err(err)
            }
        }
    }
}

fn find_row<E: GradebookEntity>(rows: &[E], sourced_id: &str) -> Option<E> {
    rows.iter()
        .find(|row| row.sourced_id() == sourced_id)
        .cloned()
}

fn has_row<E: GradebookEntity>(rows: &[E], sourced_id: &str) -> bool {
    rows.iter().any(|row| row.sourced_id() == sourced_id)
}

fn insert_row<E: GradebookEntity>(rows: &mut Vec<E>, entity: &E) -> RepoResult<()> {
    entity.validate()?;
    if has_row(rows, entity.sourced_id()) {
        return Err(RepoError::Duplicate {
            kind: E::KIND,
            sourced_id: entity.sourced_id().to_string(),
        });
    }
    rows.push(entity.clone());
    Ok(())
}

fn update_row<E: GradebookEntity>(rows: &mut [E], entity: &E) -> RepoResult<()> {
    entity.validate()?;
    let slot = rows
        .iter_mut()
        .find(|row| row.sourced_id() == entity.sourced_id())
        .ok_or_else(|| RepoError::NotFound {
            kind: E::KIND,
            sourced_id: entity.sourced_id().to_string(),
        })?;
    *slot = entity.clone();
    Ok(())
}

/// Filters, sorts and slices one table. The sort is stable, so rows with
/// equal keys stay in creation order.
fn page_rows<E: GradebookEntity>(
    rows: &[E],
    query: &ListQuery<E>,
    keep: impl Fn(&E) -> bool,
) -> Page<E> {
    let mut matching: Vec<&E> = rows
        .iter()
        .filter(|row| keep(*row) && query.matches(*row))
        .collect();
    matching.sort_by(|left, right| query.compare(left, right));
    let total_count = matching.len() as u64;
    let page = query.page();
    let items = page.slice(matching);
    Page::new(items, total_count, *page)
}

#[cfg(test)]
mod tests {
    use super::InMemoryGradebookStore;
    use crate::model::{Category, CategoryPayload};
    use crate::query::ListQuery;
    use crate::repo::{EntityRepository, GradebookStore, RepoError};

    fn category(id: &str) -> Category {
        Category::create(
            id,
            &CategoryPayload {
                title: Some(format!("title {id}")),
                ..CategoryPayload::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn insert_rejects_duplicate_sourced_id() {
        let store = InMemoryGradebookStore::new();
        store.insert(&category("c1")).unwrap();
        let err = store.insert(&category("c1")).unwrap_err();
        assert!(matches!(err, RepoError::Duplicate { .. }));
    }

    #[test]
    fn failed_transaction_restores_previous_rows() {
        let store = InMemoryGradebookStore::new();
        store.insert(&category("c1")).unwrap();

        let outcome: Result<(), RepoError> = store.in_transaction(|store| {
            store.insert(&category("c2"))?;
            store.insert(&category("c1"))
        });
        assert!(outcome.is_err());

        let page = EntityRepository::<Category>::list(&store, &ListQuery::default()).unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].base.sourced_id, "c1");
    }
}
