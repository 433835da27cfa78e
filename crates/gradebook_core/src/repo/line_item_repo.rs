//! SQLite persistence for line items.
//!
//! `category_sourced_id` is enforced by a foreign key on `categories`, so a
//! dangling reference is rejected by the engine as well as by the service.

use crate::model::{GradebookEntity, LineItem, ResourceKind};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::sqlite::{
    checked, decimal_from_column, decimal_to_column, ensure_updated, find_one, parse_base,
    query_page, row_exists, write_error, Filter, SqliteGradebookStore,
};
use crate::repo::{EntityRepository, RepoResult};
use rusqlite::{params, Connection, Row};

const LINE_ITEM_SELECT_SQL: &str = "SELECT
    sourced_id,
    status,
    date_last_modified,
    metadata,
    title,
    description,
    assign_date,
    due_date,
    score_maximum,
    category_sourced_id
FROM line_items";

impl EntityRepository<LineItem> for SqliteGradebookStore<'_> {
    fn find(&self, sourced_id: &str) -> RepoResult<Option<LineItem>> {
        find_one(self.conn(), LINE_ITEM_SELECT_SQL, sourced_id, parse_line_item_row)
    }

    fn exists(&self, sourced_id: &str) -> RepoResult<bool> {
        row_exists(self.conn(), "line_items", sourced_id)
    }

    fn insert(&self, line_item: &LineItem) -> RepoResult<()> {
        line_item.validate()?;
        self.conn()
            .execute(
                "INSERT INTO line_items (
                    sourced_id,
                    status,
                    date_last_modified,
                    metadata,
                    title,
                    description,
                    assign_date,
                    due_date,
                    score_maximum,
                    category_sourced_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    line_item.base.sourced_id,
                    line_item.base.status.as_str(),
                    line_item.base.date_last_modified,
                    line_item.base.metadata,
                    line_item.title,
                    line_item.description,
                    line_item.assign_date,
                    line_item.due_date,
                    decimal_to_column(line_item.score_maximum),
                    line_item.category_sourced_id,
                ],
            )
            .map_err(|err| write_error(err, ResourceKind::LineItem, line_item.sourced_id()))?;
        Ok(())
    }

    fn update(&self, line_item: &LineItem) -> RepoResult<()> {
        line_item.validate()?;
        let changed = self.conn().execute(
            "UPDATE line_items
             SET status = ?2,
                 date_last_modified = ?3,
                 metadata = ?4,
                 title = ?5,
                 description = ?6,
                 assign_date = ?7,
                 due_date = ?8,
                 score_maximum = ?9,
                 category_sourced_id = ?10
             WHERE sourced_id = ?1;",
            params![
                line_item.base.sourced_id,
                line_item.base.status.as_str(),
                line_item.base.date_last_modified,
                line_item.base.metadata,
                line_item.title,
                line_item.description,
                line_item.assign_date,
                line_item.due_date,
                decimal_to_column(line_item.score_maximum),
                line_item.category_sourced_id,
            ],
        )?;
        ensure_updated(changed, ResourceKind::LineItem, line_item.sourced_id())
    }

    fn list(&self, query: &ListQuery<LineItem>) -> RepoResult<Page<LineItem>> {
        query_page(
            self.conn(),
            "line_items",
            LINE_ITEM_SELECT_SQL,
            None,
            query,
            parse_line_item_row,
        )
    }
}

pub(super) fn list_for_category(
    conn: &Connection,
    category_sourced_id: &str,
    query: &ListQuery<LineItem>,
) -> RepoResult<Page<LineItem>> {
    query_page(
        conn,
        "line_items",
        LINE_ITEM_SELECT_SQL,
        Some(Filter {
            column: "category_sourced_id",
            value: category_sourced_id,
        }),
        query,
        parse_line_item_row,
    )
}

fn parse_line_item_row(row: &Row<'_>) -> RepoResult<LineItem> {
    checked(LineItem {
        base: parse_base(row)?,
        title: row.get(4)?,
        description: row.get(5)?,
        assign_date: row.get(6)?,
        due_date: row.get(7)?,
        score_maximum: decimal_from_column(row, 8, "line_items.score_maximum")?,
        category_sourced_id: row.get(9)?,
    })
}
