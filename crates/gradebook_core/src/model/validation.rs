//! Field-level validation results.
//!
//! Keys are wire field names (`title`, `scorePercent`, ...). One message is
//! kept per field; the first violation found wins.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Whether a payload describes a new record or a sparse update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadIntent {
    /// Required fields must be present.
    Create,
    /// Only present fields are checked.
    Update,
}

/// Ordered field -> message map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an error map with exactly one violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a violation unless the field already has one.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// `Ok(())` when no violation was recorded.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Requires a non-blank string.
    pub fn require_text(&mut self, field: &str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.add(field, message);
        }
    }

    /// Requires present text to be non-blank; absence is allowed.
    pub fn reject_blank(&mut self, field: &str, value: Option<&str>, message: &str) {
        if let Some(value) = value {
            self.require_text(field, value, message);
        }
    }

    /// Requires a present value to be `>= 0`.
    pub fn check_non_negative(&mut self, field: &str, value: Option<Decimal>, message: &str) {
        if matches!(value, Some(value) if value < Decimal::ZERO) {
            self.add(field, message);
        }
    }

    /// Requires a present value to lie in `[0, 1]`.
    pub fn check_unit_interval(
        &mut self,
        field: &str,
        value: Option<Decimal>,
        min_message: &str,
        max_message: &str,
    ) {
        match value {
            Some(value) if value < Decimal::ZERO => self.add(field, min_message),
            Some(value) if value > Decimal::ONE => self.add(field, max_message),
            _ => {}
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "validation failed")?;
        let mut separator = ": ";
        for (field, message) in &self.fields {
            write!(f, "{separator}{field}: {message}")?;
            separator = "; ";
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::ValidationErrors;
    use rust_decimal::Decimal;

    #[test]
    fn first_message_per_field_wins() {
        let mut errors = ValidationErrors::new();
        errors.add("weight", "first");
        errors.add("weight", "second");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("weight"), Some("first"));
    }

    #[test]
    fn unit_interval_accepts_bounds_and_rejects_outside() {
        let mut errors = ValidationErrors::new();
        errors.check_unit_interval("a", Some(Decimal::ZERO), "min", "max");
        errors.check_unit_interval("b", Some(Decimal::ONE), "min", "max");
        errors.check_unit_interval("c", None, "min", "max");
        assert!(errors.is_empty());

        errors.check_unit_interval("d", Some(Decimal::new(15, 1)), "min", "max");
        errors.check_unit_interval("e", Some(Decimal::new(-1, 2)), "min", "max");
        assert_eq!(errors.get("d"), Some("max"));
        assert_eq!(errors.get("e"), Some("min"));
    }

    #[test]
    fn display_lists_fields_in_order() {
        let mut errors = ValidationErrors::new();
        errors.add("title", "Title is required");
        errors.add("score", "Score must be at least 0.0");
        assert_eq!(
            errors.to_string(),
            "validation failed: score: Score must be at least 0.0; title: Title is required"
        );
    }

    #[test]
    fn blank_text_is_rejected_only_when_present() {
        let mut errors = ValidationErrors::new();
        errors.reject_blank("comment", None, "blank");
        assert!(errors.is_empty());
        errors.reject_blank("comment", Some("  "), "blank");
        assert_eq!(errors.get("comment"), Some("blank"));
    }
}
