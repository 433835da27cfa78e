//! Student result on a line item (the OneRoster `Result` resource).
//!
//! Named `GradeResult` in Rust to stay clear of `std::result::Result`.
//!
//! # Invariants
//! - `studentId` and `lineItemSourcedId` are non-blank.
//! - `score`, when set, is `>= 0`; `scorePercent`, when set, lies in `[0, 1]`.

use crate::model::base::{EntityBase, GradebookEntity, ResourceKind, SourcedId};
use crate::model::fields::{
    FieldKind, FieldValue, QueryField, DATE_LAST_MODIFIED_FIELD, METADATA_FIELD, SOURCED_ID_FIELD,
    STATUS_FIELD,
};
use crate::model::merge::Patch;
use crate::model::validation::{PayloadIntent, ValidationErrors};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const STUDENT_ID_REQUIRED: &str = "Student ID is required";
pub(crate) const LINE_ITEM_REQUIRED: &str = "Line item sourced ID is required";
const SCORE_MIN: &str = "Score must be at least 0.0";
const SCORE_PERCENT_MIN: &str = "Score percent must be at least 0.0";
const SCORE_PERCENT_MAX: &str = "Score percent must be at most 1.0";

/// Outcome classification for one result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreStatus {
    EarnedFull,
    EarnedPartial,
    NotEarned,
    NotSubmitted,
}

impl ScoreStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::EarnedFull => "earnedFull",
            Self::EarnedPartial => "earnedPartial",
            Self::NotEarned => "notEarned",
            Self::NotSubmitted => "notSubmitted",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "earnedFull" => Some(Self::EarnedFull),
            "earnedPartial" => Some(Self::EarnedPartial),
            "notEarned" => Some(Self::NotEarned),
            "notSubmitted" => Some(Self::NotSubmitted),
            _ => None,
        }
    }
}

/// One student's score on one line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeResult {
    #[serde(flatten)]
    pub base: EntityBase,
    /// Opaque external user id; not checked against any roster.
    pub student_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_percent: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_status: Option<ScoreStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Required weak reference to the graded line item.
    pub line_item_sourced_id: SourcedId,
}

impl GradeResult {
    /// Builds a new `active` result against an already-resolved line item.
    pub fn create(
        sourced_id: impl Into<SourcedId>,
        payload: &ResultPayload,
        line_item_sourced_id: SourcedId,
    ) -> Result<Self, ValidationErrors> {
        payload.validate(PayloadIntent::Create)?;
        let mut base = EntityBase::new(sourced_id);
        base.metadata = payload.metadata.clone();
        let result = Self {
            base,
            student_id: payload.student_id.clone().unwrap_or_default(),
            score: payload.score,
            score_percent: payload.score_percent,
            score_status: payload.score_status,
            comment: payload.comment.clone(),
            line_item_sourced_id,
        };
        result.validate()?;
        Ok(result)
    }
}

impl GradebookEntity for GradeResult {
    const KIND: ResourceKind = ResourceKind::Result;
    const QUERY_FIELDS: &'static [QueryField] = &[
        SOURCED_ID_FIELD,
        STATUS_FIELD,
        DATE_LAST_MODIFIED_FIELD,
        METADATA_FIELD,
        QueryField::new("studentId", "student_id", FieldKind::Text),
        QueryField::new("score", "score", FieldKind::Decimal),
        QueryField::new("scorePercent", "score_percent", FieldKind::Decimal),
        QueryField::new("scoreStatus", "score_status", FieldKind::Text),
        QueryField::new("comment", "comment", FieldKind::Text),
        QueryField::new("lineItemSourcedId", "line_item_sourced_id", FieldKind::Text),
    ];

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("studentId", &self.student_id, STUDENT_ID_REQUIRED);
        errors.require_text(
            "lineItemSourcedId",
            &self.line_item_sourced_id,
            LINE_ITEM_REQUIRED,
        );
        errors.check_non_negative("score", self.score, SCORE_MIN);
        errors.check_unit_interval(
            "scorePercent",
            self.score_percent,
            SCORE_PERCENT_MIN,
            SCORE_PERCENT_MAX,
        );
        errors.into_result()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue> {
        match name {
            "studentId" => Some(FieldValue::Text(self.student_id.clone())),
            "score" => self.score.map(FieldValue::Decimal),
            "scorePercent" => self.score_percent.map(FieldValue::Decimal),
            "scoreStatus" => self
                .score_status
                .map(|status| FieldValue::Text(status.as_str().to_string())),
            "comment" => self.comment.clone().map(FieldValue::Text),
            "lineItemSourcedId" => Some(FieldValue::Text(self.line_item_sourced_id.clone())),
            _ => self.base.field_value(name),
        }
    }
}

/// Inbound create/update body for results.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultPayload {
    pub sourced_id: Option<String>,
    pub student_id: Option<String>,
    pub score: Option<Decimal>,
    pub score_percent: Option<Decimal>,
    pub score_status: Option<ScoreStatus>,
    pub comment: Option<String>,
    /// Mandatory on create; absent or empty means "unchanged" on update.
    pub line_item_sourced_id: Option<String>,
    pub metadata: Option<String>,
}

impl ResultPayload {
    pub fn validate(&self, intent: PayloadIntent) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match (intent, self.student_id.as_deref()) {
            (PayloadIntent::Create, None) => errors.add("studentId", STUDENT_ID_REQUIRED),
            (_, student_id) => errors.reject_blank("studentId", student_id, STUDENT_ID_REQUIRED),
        }
        if intent == PayloadIntent::Create {
            let line_item = self.line_item_sourced_id.as_deref().unwrap_or_default();
            errors.require_text("lineItemSourcedId", line_item, LINE_ITEM_REQUIRED);
        }
        errors.check_non_negative("score", self.score, SCORE_MIN);
        errors.check_unit_interval(
            "scorePercent",
            self.score_percent,
            SCORE_PERCENT_MIN,
            SCORE_PERCENT_MAX,
        );
        errors.into_result()
    }
}

impl Patch<GradeResult> for ResultPayload {
    fn overlay(&self, target: &mut GradeResult) {
        if let Some(student_id) = &self.student_id {
            target.student_id = student_id.clone();
        }
        if let Some(score) = self.score {
            target.score = Some(score);
        }
        if let Some(score_percent) = self.score_percent {
            target.score_percent = Some(score_percent);
        }
        if let Some(score_status) = self.score_status {
            target.score_status = Some(score_status);
        }
        if let Some(comment) = &self.comment {
            target.comment = Some(comment.clone());
        }
        if let Some(metadata) = &self.metadata {
            target.base.metadata = Some(metadata.clone());
        }
    }
}
