//! SQLite-backed gradebook store.
//!
//! # Responsibility
//! - Verify the connection schema before exposing any repository API.
//! - Hold the row codecs and paging query shared by the per-kind repos.
//!
//! # Invariants
//! - Decimals are stored as canonical text and parsed back exactly.
//! - `in_transaction` uses `BEGIN IMMEDIATE`; the transaction rolls back on drop.

use crate::db::migrations::latest_version;
use crate::model::{
    EntityBase, FieldKind, FieldValue, GradeResult, GradebookEntity, LineItem, QueryField,
    ResourceKind, Status,
};
use crate::pagination::Page;
use crate::query::{Condition, FilterOp, ListQuery};
use crate::repo::{GradebookStore, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use rusqlite::{
    params_from_iter, Connection, ErrorCode, OptionalExtension, Row, ToSql, Transaction,
    TransactionBehavior,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[
    (
        "categories",
        &[
            "sourced_id",
            "status",
            "date_last_modified",
            "metadata",
            "title",
            "weight",
        ],
    ),
    (
        "line_items",
        &[
            "sourced_id",
            "status",
            "date_last_modified",
            "metadata",
            "title",
            "description",
            "assign_date",
            "due_date",
            "score_maximum",
            "category_sourced_id",
        ],
    ),
    (
        "results",
        &[
            "sourced_id",
            "status",
            "date_last_modified",
            "metadata",
            "student_id",
            "score",
            "score_percent",
            "score_status",
            "comment",
            "line_item_sourced_id",
        ],
    ),
];

/// Gradebook store over one migrated SQLite connection.
pub struct SqliteGradebookStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteGradebookStore<'conn> {
    /// Creates the store from a migrated connection.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable`/`MissingRequiredColumn` on schema drift.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

impl GradebookStore for SqliteGradebookStore<'_> {
    fn list_line_items_for_category(
        &self,
        category_sourced_id: &str,
        query: &ListQuery<LineItem>,
    ) -> RepoResult<Page<LineItem>> {
        super::line_item_repo::list_for_category(self.conn, category_sourced_id, query)
    }

    fn list_results_for_line_item(
        &self,
        line_item_sourced_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> RepoResult<Page<GradeResult>> {
        super::grade_result_repo::list_for_line_item(self.conn, line_item_sourced_id, query)
    }

    fn list_results_for_student(
        &self,
        student_id: &str,
        query: &ListQuery<GradeResult>,
    ) -> RepoResult<Page<GradeResult>> {
        super::grade_result_repo::list_for_student(self.conn, student_id, query)
    }

    fn in_transaction<T, Err, F>(&self, f: F) -> Result<T, Err>
    where
        F: FnOnce(&Self) -> Result<T, Err>,
        Err: From<RepoError>,
    {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;
        let value = f(self)?;
        tx.commit().map_err(RepoError::from)?;
        Ok(value)
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Row filter for child listings. `column` is always a static identifier.
pub(super) struct Filter<'a> {
    pub column: &'static str,
    pub value: &'a str,
}

pub(super) fn find_one<E>(
    conn: &Connection,
    select_sql: &str,
    sourced_id: &str,
    parse: fn(&Row<'_>) -> RepoResult<E>,
) -> RepoResult<Option<E>> {
    let mut stmt = conn.prepare(&format!("{select_sql} WHERE sourced_id = ?1;"))?;
    let mut rows = stmt.query([sourced_id])?;
    match rows.next()? {
        Some(row) => parse(row).map(Some),
        None => Ok(None),
    }
}

pub(super) fn row_exists(conn: &Connection, table: &str, sourced_id: &str) -> RepoResult<bool> {
    let found = conn
        .query_row(
            &format!("SELECT 1 FROM {table} WHERE sourced_id = ?1;"),
            [sourced_id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Loads one filtered, sorted page plus the total matching row count.
///
/// Sort keys come first; creation sequence breaks ties. Every caller value
/// is bound as a parameter, and column names come from the field whitelist.
pub(super) fn query_page<E>(
    conn: &Connection,
    table: &str,
    select_sql: &str,
    parent: Option<Filter<'_>>,
    query: &ListQuery<E>,
    parse: fn(&Row<'_>) -> RepoResult<E>,
) -> RepoResult<Page<E>> {
    let mut params = SqlParams::default();
    let mut predicates = Vec::new();
    if let Some(parent) = parent {
        let placeholder = params.push(parent.value.to_string());
        predicates.push(format!("{} = {placeholder}", parent.column));
    }
    for condition in query.conditions() {
        predicates.push(condition_sql(condition, &mut params)?);
    }
    let where_clause = if predicates.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", predicates.join(" AND "))
    };

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {table}{where_clause};"),
        params_from_iter(params.values.iter()),
        |row| row.get(0),
    )?;

    let mut order_by: Vec<String> = query
        .sort_keys()
        .iter()
        .map(|key| {
            let direction = if key.descending { "DESC" } else { "ASC" };
            format!("{} {direction}", column_expr(&key.field))
        })
        .collect();
    order_by.push("id ASC".to_string());

    let page = query.page();
    let limit = params.push(i64::from(page.limit()));
    let offset = params.push(i64::try_from(page.start()).unwrap_or(i64::MAX));
    let sql = format!(
        "{select_sql}{where_clause} ORDER BY {} LIMIT {limit} OFFSET {offset};",
        order_by.join(", ")
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params_from_iter(params.values.iter()))?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }

    Ok(Page::new(items, u64::try_from(total).unwrap_or(0), *page))
}

/// Positional parameters in binding order.
#[derive(Default)]
struct SqlParams {
    values: Vec<Box<dyn ToSql>>,
}

impl SqlParams {
    /// Appends a value and returns its `?N` placeholder.
    fn push(&mut self, value: impl ToSql + 'static) -> String {
        self.values.push(Box::new(value));
        format!("?{}", self.values.len())
    }
}

/// Decimals are stored as text; compare and sort them numerically.
fn column_expr(field: &QueryField) -> String {
    match field.kind {
        FieldKind::Decimal => format!("CAST({} AS REAL)", field.column),
        FieldKind::Text | FieldKind::Date | FieldKind::Timestamp => field.column.to_string(),
    }
}

fn condition_sql(condition: &Condition, params: &mut SqlParams) -> RepoResult<String> {
    let column = column_expr(&condition.field);
    if condition.op == FilterOp::Contains {
        let FieldValue::Text(needle) = &condition.operand else {
            return Err(RepoError::InvalidData(format!(
                "operator ~ on non-text field {}",
                condition.field.name
            )));
        };
        let placeholder = params.push(format!("%{}%", escape_like(needle)));
        return Ok(format!("{column} LIKE {placeholder} ESCAPE '\\'"));
    }

    let placeholder = match &condition.operand {
        FieldValue::Text(value) => params.push(value.clone()),
        FieldValue::Decimal(value) => params.push(value.to_f64().ok_or_else(|| {
            RepoError::InvalidData(format!("decimal operand out of range: {value}"))
        })?),
        FieldValue::Date(value) => params.push(*value),
        FieldValue::Timestamp(value) => params.push(*value),
    };
    Ok(format!("{column} {} {placeholder}", condition.op.sql()))
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Reads the four base columns, which every select lists first.
pub(super) fn parse_base(row: &Row<'_>) -> RepoResult<EntityBase> {
    let sourced_id: String = row.get(0)?;
    let status_text: String = row.get(1)?;
    let status = Status::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` for `{sourced_id}`"))
    })?;
    let date_last_modified: DateTime<Utc> = row.get(2)?;
    let metadata: Option<String> = row.get(3)?;

    Ok(EntityBase {
        sourced_id,
        status,
        date_last_modified,
        metadata,
    })
}

pub(super) fn decimal_from_column(
    row: &Row<'_>,
    index: usize,
    column: &'static str,
) -> RepoResult<Option<Decimal>> {
    let text: Option<String> = row.get(index)?;
    text.map(|value| {
        Decimal::from_str(&value)
            .map_err(|_| RepoError::InvalidData(format!("invalid decimal `{value}` in {column}")))
    })
    .transpose()
}

pub(super) fn decimal_to_column(value: Option<Decimal>) -> Option<String> {
    value.map(|value| value.to_string())
}

/// Re-checks a decoded row; stored records must satisfy the model rules.
pub(super) fn checked<E: GradebookEntity>(entity: E) -> RepoResult<E> {
    entity.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "{} `{}` fails validation: {err}",
            E::KIND,
            entity.sourced_id()
        ))
    })?;
    Ok(entity)
}

/// Maps a write failure, turning unique-key violations into `Duplicate`.
pub(super) fn write_error(err: rusqlite::Error, kind: ResourceKind, sourced_id: &str) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation
                && failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Duplicate {
                kind,
                sourced_id: sourced_id.to_string(),
            }
        }
        _ => RepoError::from(err),
    }
}

pub(super) fn ensure_updated(changed: usize, kind: ResourceKind, sourced_id: &str) -> RepoResult<()> {
    if changed == 0 {
        return Err(RepoError::NotFound {
            kind,
            sourced_id: sourced_id.to_string(),
        });
    }
    Ok(())
}
