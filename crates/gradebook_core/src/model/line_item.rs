//! Line item (assignment or assessment).
//!
//! # Invariants
//! - `title` is non-blank.
//! - `scoreMaximum`, when set, is `>= 0`.
//! - `categorySourcedId` is optional; when set it named an existing category
//!   at the time of the write.

use crate::model::base::{EntityBase, GradebookEntity, ResourceKind, SourcedId};
use crate::model::category::TITLE_REQUIRED;
use crate::model::fields::{
    FieldKind, FieldValue, QueryField, DATE_LAST_MODIFIED_FIELD, METADATA_FIELD, SOURCED_ID_FIELD,
    STATUS_FIELD,
};
use crate::model::merge::Patch;
use crate::model::validation::{PayloadIntent, ValidationErrors};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const SCORE_MAXIMUM_MIN: &str = "Score maximum must be at least 0.0";

/// Gradable activity, optionally grouped under a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    #[serde(flatten)]
    pub base: EntityBase,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assign_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_maximum: Option<Decimal>,
    /// Weak reference to the owning category.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_sourced_id: Option<SourcedId>,
}

impl LineItem {
    /// Builds a new `active` line item.
    ///
    /// `category_sourced_id` must already be resolved by the caller.
    pub fn create(
        sourced_id: impl Into<SourcedId>,
        payload: &LineItemPayload,
        category_sourced_id: Option<SourcedId>,
    ) -> Result<Self, ValidationErrors> {
        payload.validate(PayloadIntent::Create)?;
        let mut base = EntityBase::new(sourced_id);
        base.metadata = payload.metadata.clone();
        let line_item = Self {
            base,
            title: payload.title.clone().unwrap_or_default(),
            description: payload.description.clone(),
            assign_date: payload.assign_date,
            due_date: payload.due_date,
            score_maximum: payload.score_maximum,
            category_sourced_id,
        };
        line_item.validate()?;
        Ok(line_item)
    }
}

impl GradebookEntity for LineItem {
    const KIND: ResourceKind = ResourceKind::LineItem;
    const QUERY_FIELDS: &'static [QueryField] = &[
        SOURCED_ID_FIELD,
        STATUS_FIELD,
        DATE_LAST_MODIFIED_FIELD,
        METADATA_FIELD,
        QueryField::new("title", "title", FieldKind::Text),
        QueryField::new("description", "description", FieldKind::Text),
        QueryField::new("assignDate", "assign_date", FieldKind::Date),
        QueryField::new("dueDate", "due_date", FieldKind::Date),
        QueryField::new("scoreMaximum", "score_maximum", FieldKind::Decimal),
        QueryField::new("categorySourcedId", "category_sourced_id", FieldKind::Text),
    ];

    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.require_text("title", &self.title, TITLE_REQUIRED);
        errors.check_non_negative("scoreMaximum", self.score_maximum, SCORE_MAXIMUM_MIN);
        errors.into_result()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue> {
        match name {
            "title" => Some(FieldValue::Text(self.title.clone())),
            "description" => self.description.clone().map(FieldValue::Text),
            "assignDate" => self.assign_date.map(FieldValue::Date),
            "dueDate" => self.due_date.map(FieldValue::Date),
            "scoreMaximum" => self.score_maximum.map(FieldValue::Decimal),
            "categorySourcedId" => self.category_sourced_id.clone().map(FieldValue::Text),
            _ => self.base.field_value(name),
        }
    }
}

/// Inbound create/update body for line items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItemPayload {
    pub sourced_id: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assign_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub score_maximum: Option<Decimal>,
    /// Absent or empty means "no category" on create, "unchanged" on update.
    pub category_sourced_id: Option<String>,
    pub metadata: Option<String>,
}

impl LineItemPayload {
    pub fn validate(&self, intent: PayloadIntent) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match (intent, self.title.as_deref()) {
            (PayloadIntent::Create, None) => errors.add("title", TITLE_REQUIRED),
            (_, title) => errors.reject_blank("title", title, TITLE_REQUIRED),
        }
        errors.check_non_negative("scoreMaximum", self.score_maximum, SCORE_MAXIMUM_MIN);
        errors.into_result()
    }
}

impl Patch<LineItem> for LineItemPayload {
    fn overlay(&self, target: &mut LineItem) {
        if let Some(title) = &self.title {
            target.title = title.clone();
        }
        if let Some(description) = &self.description {
            target.description = Some(description.clone());
        }
        if let Some(assign_date) = self.assign_date {
            target.assign_date = Some(assign_date);
        }
        if let Some(due_date) = self.due_date {
            target.due_date = Some(due_date);
        }
        if let Some(score_maximum) = self.score_maximum {
            target.score_maximum = Some(score_maximum);
        }
        if let Some(metadata) = &self.metadata {
            target.base.metadata = Some(metadata.clone());
        }
    }
}
