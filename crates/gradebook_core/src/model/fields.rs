//! Queryable field descriptors.
//!
//! Each resource publishes the wire fields a listing may filter, sort or
//! project on, together with the storage column behind each one.

use crate::model::base::EntityBase;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Value domain of a queryable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Decimal,
    Date,
    Timestamp,
}

/// One whitelisted wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryField {
    /// Wire name, e.g. `scoreMaximum`.
    pub name: &'static str,
    /// Storage column. Always a fixed identifier, never caller input.
    pub column: &'static str,
    pub kind: FieldKind,
}

impl QueryField {
    pub const fn new(name: &'static str, column: &'static str, kind: FieldKind) -> Self {
        Self { name, column, kind }
    }
}

pub(crate) const SOURCED_ID_FIELD: QueryField =
    QueryField::new("sourcedId", "sourced_id", FieldKind::Text);
pub(crate) const STATUS_FIELD: QueryField = QueryField::new("status", "status", FieldKind::Text);
pub(crate) const DATE_LAST_MODIFIED_FIELD: QueryField =
    QueryField::new("dateLastModified", "date_last_modified", FieldKind::Timestamp);
pub(crate) const METADATA_FIELD: QueryField =
    QueryField::new("metadata", "metadata", FieldKind::Text);

/// Typed field value. Values of one kind order naturally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FieldValue {
    Text(String),
    Decimal(Decimal),
    Date(NaiveDate),
    Timestamp(DateTime<Utc>),
}

impl FieldValue {
    /// Parses `raw` as a value of `kind`.
    ///
    /// Dates are `YYYY-MM-DD`; timestamps are RFC 3339.
    pub fn parse(kind: FieldKind, raw: &str) -> Option<Self> {
        match kind {
            FieldKind::Text => Some(Self::Text(raw.to_string())),
            FieldKind::Decimal => Decimal::from_str(raw).ok().map(Self::Decimal),
            FieldKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(Self::Date),
            FieldKind::Timestamp => DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|value| Self::Timestamp(value.with_timezone(&Utc))),
        }
    }
}

impl EntityBase {
    /// Value of a base wire field; `None` for unset or non-base fields.
    pub fn field_value(&self, name: &str) -> Option<FieldValue> {
        match name {
            "sourcedId" => Some(FieldValue::Text(self.sourced_id.clone())),
            "status" => Some(FieldValue::Text(self.status.as_str().to_string())),
            "dateLastModified" => Some(FieldValue::Timestamp(self.date_last_modified)),
            "metadata" => self.metadata.clone().map(FieldValue::Text),
            _ => None,
        }
    }
}
