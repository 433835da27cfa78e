//! SQLite persistence for categories.

use crate::model::{Category, GradebookEntity, ResourceKind};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::sqlite::{
    checked, decimal_from_column, decimal_to_column, ensure_updated, find_one, parse_base,
    query_page, row_exists, write_error, SqliteGradebookStore,
};
use crate::repo::{EntityRepository, RepoResult};
use rusqlite::{params, Row};

const CATEGORY_SELECT_SQL: &str = "SELECT
    sourced_id,
    status,
    date_last_modified,
    metadata,
    title,
    weight
FROM categories";

impl EntityRepository<Category> for SqliteGradebookStore<'_> {
    fn find(&self, sourced_id: &str) -> RepoResult<Option<Category>> {
        find_one(self.conn(), CATEGORY_SELECT_SQL, sourced_id, parse_category_row)
    }

    fn exists(&self, sourced_id: &str) -> RepoResult<bool> {
        row_exists(self.conn(), "categories", sourced_id)
    }

    fn insert(&self, category: &Category) -> RepoResult<()> {
        category.validate()?;
        self.conn()
            .execute(
                "INSERT INTO categories (
                    sourced_id,
                    status,
                    date_last_modified,
                    metadata,
                    title,
                    weight
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    category.base.sourced_id,
                    category.base.status.as_str(),
                    category.base.date_last_modified,
                    category.base.metadata,
                    category.title,
                    decimal_to_column(category.weight),
                ],
            )
            .map_err(|err| write_error(err, ResourceKind::Category, category.sourced_id()))?;
        Ok(())
    }

    fn update(&self, category: &Category) -> RepoResult<()> {
        category.validate()?;
        let changed = self.conn().execute(
            "UPDATE categories
             SET status = ?2,
                 date_last_modified = ?3,
                 metadata = ?4,
                 title = ?5,
                 weight = ?6
             WHERE sourced_id = ?1;",
            params![
                category.base.sourced_id,
                category.base.status.as_str(),
                category.base.date_last_modified,
                category.base.metadata,
                category.title,
                decimal_to_column(category.weight),
            ],
        )?;
        ensure_updated(changed, ResourceKind::Category, category.sourced_id())
    }

    fn list(&self, query: &ListQuery<Category>) -> RepoResult<Page<Category>> {
        query_page(
            self.conn(),
            "categories",
            CATEGORY_SELECT_SQL,
            None,
            query,
            parse_category_row,
        )
    }
}

fn parse_category_row(row: &Row<'_>) -> RepoResult<Category> {
    checked(Category {
        base: parse_base(row)?,
        title: row.get(4)?,
        weight: decimal_from_column(row, 5, "categories.weight")?,
    })
}
