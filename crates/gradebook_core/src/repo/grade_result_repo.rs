//! SQLite persistence for results.

use crate::model::{GradeResult, GradebookEntity, ResourceKind, ScoreStatus};
use crate::pagination::Page;
use crate::query::ListQuery;
use crate::repo::sqlite::{
    checked, decimal_from_column, decimal_to_column, ensure_updated, find_one, parse_base,
    query_page, row_exists, write_error, Filter, SqliteGradebookStore,
};
use crate::repo::{EntityRepository, RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const RESULT_SELECT_SQL: &str = "SELECT
    sourced_id,
    status,
    date_last_modified,
    metadata,
    student_id,
    score,
    score_percent,
    score_status,
    comment,
    line_item_sourced_id
FROM results";

impl EntityRepository<GradeResult> for SqliteGradebookStore<'_> {
    fn find(&self, sourced_id: &str) -> RepoResult<Option<GradeResult>> {
        find_one(self.conn(), RESULT_SELECT_SQL, sourced_id, parse_result_row)
    }

    fn exists(&self, sourced_id: &str) -> RepoResult<bool> {
        row_exists(self.conn(), "results", sourced_id)
    }

    fn insert(&self, result: &GradeResult) -> RepoResult<()> {
        result.validate()?;
        self.conn()
            .execute(
                "INSERT INTO results (
                    sourced_id,
                    status,
                    date_last_modified,
                    metadata,
                    student_id,
                    score,
                    score_percent,
                    score_status,
                    comment,
                    line_item_sourced_id
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10);",
                params![
                    result.base.sourced_id,
                    result.base.status.as_str(),
                    result.base.date_last_modified,
                    result.base.metadata,
                    result.student_id,
                    decimal_to_column(result.score),
                    decimal_to_column(result.score_percent),
                    result.score_status.map(ScoreStatus::as_str),
                    result.comment,
                    result.line_item_sourced_id,
                ],
            )
            .map_err(|err| write_error(err, ResourceKind::Result, result.sourced_id()))?;
        Ok(())
    }

    fn update(&self, result: &GradeResult) -> RepoResult<()> {
        result.validate()?;
        let changed = self.conn().execute(
            "UPDATE results
             SET status = ?2,
                 date_last_modified = ?3,
                 metadata = ?4,
                 student_id = ?5,
                 score = ?6,
                 score_percent = ?7,
                 score_status = ?8,
                 comment = ?9,
                 line_item_sourced_id = ?10
             WHERE sourced_id = ?1;",
            params![
                result.base.sourced_id,
                result.base.status.as_str(),
                result.base.date_last_modified,
                result.base.metadata,
                result.student_id,
                decimal_to_column(result.score),
                decimal_to_column(result.score_percent),
                result.score_status.map(ScoreStatus::as_str),
                result.comment,
                result.line_item_sourced_id,
            ],
        )?;
        ensure_updated(changed, ResourceKind::Result, result.sourced_id())
    }

    fn list(&self, query: &ListQuery<GradeResult>) -> RepoResult<Page<GradeResult>> {
        query_page(
            self.conn(),
            "results",
            RESULT_SELECT_SQL,
            None,
            query,
            parse_result_row,
        )
    }
}

pub(super) fn list_for_line_item(
    conn: &Connection,
    line_item_sourced_id: &str,
    query: &ListQuery<GradeResult>,
) -> RepoResult<Page<GradeResult>> {
    query_page(
        conn,
        "results",
        RESULT_SELECT_SQL,
        Some(Filter {
            column: "line_item_sourced_id",
            value: line_item_sourced_id,
        }),
        query,
        parse_result_row,
    )
}

pub(super) fn list_for_student(
    conn: &Connection,
    student_id: &str,
    query: &ListQuery<GradeResult>,
) -> RepoResult<Page<GradeResult>> {
    query_page(
        conn,
        "results",
        RESULT_SELECT_SQL,
        Some(Filter {
            column: "student_id",
            value: student_id,
        }),
        query,
        parse_result_row,
    )
}

fn parse_result_row(row: &Row<'_>) -> RepoResult<GradeResult> {
    let score_status = row
        .get::<_, Option<String>>(7)?
        .map(|value| {
            ScoreStatus::parse(&value).ok_or_else(|| {
                RepoError::InvalidData(format!("invalid score_status `{value}`"))
            })
        })
        .transpose()?;

    checked(GradeResult {
        base: parse_base(row)?,
        student_id: row.get(4)?,
        score: decimal_from_column(row, 5, "results.score")?,
        score_percent: decimal_from_column(row, 6, "results.score_percent")?,
        score_status,
        comment: row.get(8)?,
        line_item_sourced_id: row.get(9)?,
    })
}
