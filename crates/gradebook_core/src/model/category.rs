//! Grading category.
//!
//! # Invariants
//! - `title` is non-blank.
//! - `weight`, when set, lies in `[0.0, 1.0]`.
//! - A category owns no child objects; line items point at it by id.

use crate::model::base::{EntityBase, GradebookEntity, ResourceKind, SourcedId};
use crate::model::fields::{
    FieldKind, FieldValue, QueryField, DATE_LAST_MODIFIED_FIELD, METADATA_FIELD, SOURCED_ID_FIELD,
    STATUS_FIELD,
};
use crate::model::merge::Patch;
use crate::model::validation::{PayloadIntent, ValidationErrors};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub(crate) const TITLE_REQUIRED: &str = "Title is required";
const WEIGHT_MIN: &str = "Weight must be at least 0.0";
const WEIGHT_MAX: &str = "Weight must be at most 1.0";

/// Weighted grouping of line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(flatten)]
    pub base: EntityBase,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
}

impl Category {
    /// Builds a new `active` category from a create payload.
    ///
    /// Reference-free: the caller has already assigned `sourced_id`.
    pub fn create(
        sourced_id: impl Into<SourcedId>,
        payload: &CategoryPayload,
    ) -> Result<Self, ValidationErrors> {
        payload.validate(PayloadIntent::Create)?;
        let mut base = EntityBase::new(sourced_id);
        base.metadata = payload.metadata.clone();
        let category = Self {
            base,
            title: payload.title.clone().unwrap_or_default(),
            weight: payload.weight,
        };
        category.validate()?;
        Ok(category)
    }
}

impl GradebookEntity for Category {
    const KIND: ResourceKind = ResourceKind::Category;
    const QUERY_FIELDS: &'static [QueryField] = &[
        SOURCED_ID_FIELD,
        STATUS_FIELD,
        DATE_LAST_MODIFIED_FIELD,
        METADATA_FIELD,
        QueryField::new("title", "title", FieldKind::Text),
        QueryField::new("weight", "weight", FieldKind::Decimal),
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
        errors.check_unit_interval("weight", self.weight, WEIGHT_MIN, WEIGHT_MAX);
        errors.into_result()
    }

    fn field_value(&self, name: &str) -> Option<FieldValue> {
        match name {
            "title" => Some(FieldValue::Text(self.title.clone())),
            "weight" => self.weight.map(FieldValue::Decimal),
            _ => self.base.field_value(name),
        }
    }
}

/// Inbound create/update body. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    /// Honored on create only; the path id wins on update.
    pub sourced_id: Option<String>,
    pub title: Option<String>,
    pub weight: Option<Decimal>,
    pub metadata: Option<String>,
}

impl CategoryPayload {
    /// Checks the fields this payload carries.
    pub fn validate(&self, intent: PayloadIntent) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match (intent, self.title.as_deref()) {
            (PayloadIntent::Create, None) => errors.add("title", TITLE_REQUIRED),
            (_, title) => errors.reject_blank("title", title, TITLE_REQUIRED),
        }
        errors.check_unit_interval("weight", self.weight, WEIGHT_MIN, WEIGHT_MAX);
        errors.into_result()
    }
}

impl Patch<Category> for CategoryPayload {
    fn overlay(&self, target: &mut Category) {
        if let Some(title) = &self.title {
            target.title = title.clone();
        }
        if let Some(weight) = self.weight {
            target.weight = Some(weight);
        }
        if let Some(metadata) = &self.metadata {
            target.base.metadata = Some(metadata.clone());
        }
    }
}
