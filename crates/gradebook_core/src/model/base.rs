//! Base attributes and lifecycle shared by every gradebook resource.
//!
//! # Responsibility
//! - Define `sourcedId`, `status`, `dateLastModified` and `metadata`.
//! - Provide the soft-delete transition and modification stamping.
//!
//! # Invariants
//! - `status` only moves `active -> tobedeleted`; there is no restore path.
//! - `dateLastModified` is server-stamped and never moves backwards.

use crate::model::fields::{FieldValue, QueryField};
use crate::model::validation::ValidationErrors;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// External identifier used for every lookup. Distinct from storage row keys.
pub type SourcedId = String;

/// Resource kind discriminator used in errors, scopes and storage routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    Category,
    LineItem,
    Result,
}

impl ResourceKind {
    /// Human-facing resource name, matching the OneRoster type names.
    pub fn label(self) -> &'static str {
        match self {
            Self::Category => "Category",
            Self::LineItem => "LineItem",
            Self::Result => "Result",
        }
    }

    /// Plural wire key used by listing envelopes.
    pub fn collection_key(self) -> &'static str {
        match self {
            Self::Category => "categories",
            Self::LineItem => "lineItems",
            Self::Result => "results",
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Record status exposed on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[default]
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "tobedeleted")]
    ToBeDeleted,
}

impl Status {
    /// Stable string form shared by wire and storage.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::ToBeDeleted => "tobedeleted",
        }
    }

    /// Parses the stable string form. Unknown values return `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(Self::Active),
            "tobedeleted" => Some(Self::ToBeDeleted),
            _ => None,
        }
    }
}

/// Attributes carried by every gradebook resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityBase {
    /// Immutable once assigned; never reused, including after soft delete.
    pub sourced_id: SourcedId,
    pub status: Status,
    /// Refreshed on every mutation, including repeated deletes.
    pub date_last_modified: DateTime<Utc>,
    /// Opaque passthrough (typically serialized JSON).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

impl EntityBase {
    /// Creates an `active` base stamped with the current time.
    pub fn new(sourced_id: impl Into<SourcedId>) -> Self {
        Self {
            sourced_id: sourced_id.into(),
            status: Status::Active,
            date_last_modified: Utc::now(),
            metadata: None,
        }
    }

    /// Refreshes `date_last_modified`, clamped so it never moves backwards.
    pub fn touch(&mut self) {
        self.date_last_modified = Utc::now().max(self.date_last_modified);
    }

    /// Applies the soft-delete transition. Repeating it only re-stamps.
    pub fn mark_to_be_deleted(&mut self) {
        self.status = Status::ToBeDeleted;
        self.touch();
    }
}

/// Shared contract for the three resource types.
///
/// Lets identity, lifecycle and persistence code stay generic over the
/// concrete resource.
pub trait GradebookEntity: Clone {
    const KIND: ResourceKind;

    /// Wire fields a listing may filter, sort or project on.
    const QUERY_FIELDS: &'static [QueryField];

    fn base(&self) -> &EntityBase;

    fn base_mut(&mut self) -> &mut EntityBase;

    /// Checks every field constraint on the full record.
    fn validate(&self) -> Result<(), ValidationErrors>;

    /// Current value of wire field `name`; `None` when unset or unknown.
    fn field_value(&self, name: &str) -> Option<FieldValue>;

    fn sourced_id(&self) -> &str {
        self.base().sourced_id.as_str()
    }
}
