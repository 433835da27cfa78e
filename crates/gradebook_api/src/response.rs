//! Response values and the error envelope.
//!
//! # Invariants
//! - Unexpected failures never expose internal detail to callers.
//! - Every error body carries `kind`, `status`, `error`, `message` and
//!   `timestamp`; validation failures add an `errors` field map.

use chrono::{SecondsFormat, Utc};
use gradebook_core::{ErrorKind, GradebookError, Page, ResourceKind};
use log::{error, info};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

pub const TOTAL_COUNT_HEADER: &str = "X-Total-Count";
const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";
const FORBIDDEN_MESSAGE: &str = "Insufficient permissions";
const VALIDATION_MESSAGE: &str = "Validation failed";

/// Transport-neutral response: HTTP status, headers and optional JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiResponse {
    pub fn ok(body: Value) -> Self {
        Self::with_body(200, body)
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            headers: Vec::new(),
            body: None,
        }
    }

    fn with_body(status: u16, body: Value) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Serializes `value` as the body, or degrades to a 500 envelope.
    pub(crate) fn json<T: Serialize>(status: u16, value: &T, operation: &str) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self::with_body(status, body),
            Err(err) => {
                error!(
                    "event=api_request module=api status=error operation={operation} error_code=serialize_failed error={err}"
                );
                Self::unexpected()
            }
        }
    }

    /// Wraps a page under the plural collection key, with `totalCount` in
    /// both body and header. `fields` keeps only the named keys per item.
    pub(crate) fn page<T: Serialize>(
        kind: ResourceKind,
        page: &Page<T>,
        fields: Option<&[&str]>,
        operation: &str,
    ) -> Self {
        let mut items = match serde_json::to_value(&page.items) {
            Ok(items) => items,
            Err(err) => {
                error!(
                    "event=api_request module=api status=error operation={operation} error_code=serialize_failed error={err}"
                );
                return Self::unexpected();
            }
        };
        if let (Some(fields), Value::Array(items)) = (fields, &mut items) {
            for item in items.iter_mut() {
                if let Value::Object(object) = item {
                    object.retain(|key, _| fields.contains(&key.as_str()));
                }
            }
        }

        let mut body = Map::new();
        body.insert(kind.collection_key().to_string(), items);
        body.insert("totalCount".to_string(), Value::from(page.total_count));

        let mut response = Self::ok(Value::Object(body));
        response
            .headers
            .push((TOTAL_COUNT_HEADER.to_string(), page.total_count.to_string()));
        response
    }

    /// Maps a service error onto its status and envelope, logging by kind.
    pub fn from_error(err: &GradebookError, operation: &str) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Unexpected {
            error!(
                "event=api_request module=api status=error operation={operation} error_kind={} error={err}",
                kind.code()
            );
        } else {
            info!(
                "event=api_request module=api status=rejected operation={operation} error_kind={}",
                kind.code()
            );
        }

        let message = match kind {
            ErrorKind::Unexpected => UNEXPECTED_MESSAGE.to_string(),
            ErrorKind::Forbidden => FORBIDDEN_MESSAGE.to_string(),
            ErrorKind::ValidationFailed => VALIDATION_MESSAGE.to_string(),
            ErrorKind::NotFound | ErrorKind::DuplicateResource => err.to_string(),
        };
        let errors = err.field_errors().map(|errors| errors.fields().clone());
        Self::error_envelope(kind, message, errors)
    }

    fn unexpected() -> Self {
        Self::error_envelope(ErrorKind::Unexpected, UNEXPECTED_MESSAGE.to_string(), None)
    }

    fn error_envelope(
        kind: ErrorKind,
        message: String,
        errors: Option<BTreeMap<String, String>>,
    ) -> Self {
        let (status, reason) = status_of(kind);
        let envelope = ErrorEnvelope {
            kind: kind.code(),
            status,
            error: reason,
            message,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            errors,
        };
        // A struct of strings and a map of strings always serializes.
        let body = serde_json::to_value(&envelope).unwrap_or(Value::Null);
        Self::with_body(status, body)
    }

    /// First value of header `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    kind: &'static str,
    status: u16,
    error: &'static str,
    message: String,
    timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<BTreeMap<String, String>>,
}

fn status_of(kind: ErrorKind) -> (u16, &'static str) {
    match kind {
        ErrorKind::NotFound => (404, "Not Found"),
        ErrorKind::DuplicateResource => (400, "Bad Request"),
        ErrorKind::ValidationFailed => (400, "Validation Failed"),
        ErrorKind::Forbidden => (403, "Forbidden"),
        ErrorKind::Unexpected => (500, "Internal Server Error"),
    }
}
