//! OneRoster listing query: `filter`, `sort` and `fields`.
//!
//! # Invariants
//! - Field names are resolved against the resource's whitelist; caller text
//!   never reaches SQL except as a bound parameter.
//! - Filter terms are joined with ` AND `; every term must hold.
//! - A term on an unset field never matches.
//! - Sort keys apply left to right; creation sequence breaks ties.
//! - A field projection always keeps `sourcedId`, `status` and
//!   `dateLastModified`.

use crate::model::{FieldKind, FieldValue, GradebookEntity, QueryField, ValidationErrors};
use crate::pagination::PageRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::marker::PhantomData;

static FILTER_JOIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+AND\s+").expect("valid filter join regex"));
static FILTER_TERM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z]+)\s*(!=|<=|>=|=|<|>|~)\s*(?:'([^']*)'|(-?\d+(?:\.\d+)?))$")
        .expect("valid filter term regex")
});
static SORT_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-)?([A-Za-z]+)(?:\s+([A-Za-z]+))?$").expect("valid sort key regex")
});

const ALWAYS_PROJECTED: [&str; 3] = ["sourcedId", "status", "dateLastModified"];

/// Comparison operator of one filter term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    /// Case-insensitive (ASCII) substring match on text fields.
    Contains,
}

impl FilterOp {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "=" => Some(Self::Eq),
            "!=" => Some(Self::NotEq),
            "<" => Some(Self::Lt),
            "<=" => Some(Self::Le),
            ">" => Some(Self::Gt),
            ">=" => Some(Self::Ge),
            "~" => Some(Self::Contains),
            _ => None,
        }
    }

    /// SQL operator for this comparison.
    pub fn sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Contains => "LIKE",
        }
    }

    fn holds(self, value: &FieldValue, operand: &FieldValue) -> bool {
        match self {
            Self::Eq => value == operand,
            Self::NotEq => value != operand,
            Self::Lt => value < operand,
            Self::Le => value <= operand,
            Self::Gt => value > operand,
            Self::Ge => value >= operand,
            Self::Contains => match (value, operand) {
                (FieldValue::Text(value), FieldValue::Text(needle)) => value
                    .to_ascii_lowercase()
                    .contains(&needle.to_ascii_lowercase()),
                _ => false,
            },
        }
    }
}

/// One parsed filter term, e.g. `weight>'0.2'`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub field: QueryField,
    pub op: FilterOp,
    /// Operand typed by the field's kind.
    pub operand: FieldValue,
}

impl Condition {
    fn holds_for(&self, value: Option<FieldValue>) -> bool {
        value.is_some_and(|value| self.op.holds(&value, &self.operand))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortKey {
    pub field: QueryField,
    pub descending: bool,
}

/// Listing window plus optional filter, sort and projection for kind `E`.
#[derive(Debug, Clone)]
pub struct ListQuery<E> {
    page: PageRequest,
    conditions: Vec<Condition>,
    sort_keys: Vec<SortKey>,
    fields: Option<Vec<&'static str>>,
    _kind: PhantomData<fn() -> E>,
}

impl<E> Default for ListQuery<E> {
    fn default() -> Self {
        Self::from(PageRequest::default())
    }
}

impl<E> From<PageRequest> for ListQuery<E> {
    fn from(page: PageRequest) -> Self {
        Self {
            page,
            conditions: Vec::new(),
            sort_keys: Vec::new(),
            fields: None,
            _kind: PhantomData,
        }
    }
}

impl<E> ListQuery<E> {
    pub fn page(&self) -> &PageRequest {
        &self.page
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn sort_keys(&self) -> &[SortKey] {
        &self.sort_keys
    }

    /// Wire fields to keep in each listed item, or `None` for all.
    pub fn fields(&self) -> Option<&[&'static str]> {
        self.fields.as_deref()
    }
}

impl<E: GradebookEntity> ListQuery<E> {
    /// Parses raw `filter`, `sort` and `fields` parameters for kind `E`.
    ///
    /// Blank parameters count as absent. Each parameter reports its first
    /// problem under its own name.
    ///
    /// # Errors
    /// - Malformed terms, unknown field names, operands that do not parse
    ///   as the field's kind, and `~` on a non-text field.
    pub fn parse(
        page: PageRequest,
        filter: Option<&str>,
        sort: Option<&str>,
        fields: Option<&str>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut query = Self::from(page);

        match present(filter).map(parse_filter::<E>).transpose() {
            Ok(conditions) => query.conditions = conditions.unwrap_or_default(),
            Err(message) => errors.add("filter", message),
        }
        match present(sort).map(parse_sort::<E>).transpose() {
            Ok(sort_keys) => query.sort_keys = sort_keys.unwrap_or_default(),
            Err(message) => errors.add("sort", message),
        }
        match present(fields).map(parse_fields::<E>).transpose() {
            Ok(fields) => query.fields = fields,
            Err(message) => errors.add("fields", message),
        }

        errors.into_result()?;
        Ok(query)
    }

    /// Whether `entity` satisfies every filter term.
    pub fn matches(&self, entity: &E) -> bool {
        self.conditions
            .iter()
            .all(|condition| condition.holds_for(entity.field_value(condition.field.name)))
    }

    /// Orders two records by the sort keys. Unset values sort first in
    /// ascending order; `Equal` leaves creation order to the caller.
    pub fn compare(&self, left: &E, right: &E) -> Ordering {
        for key in &self.sort_keys {
            let ordering = left
                .field_value(key.field.name)
                .cmp(&right.field_value(key.field.name));
            let ordering = if key.descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn lookup_field<E: GradebookEntity>(name: &str) -> Result<QueryField, String> {
    E::QUERY_FIELDS
        .iter()
        .find(|field| field.name == name)
        .copied()
        .ok_or_else(|| format!("Unknown field: {name}"))
}

fn parse_filter<E: GradebookEntity>(filter: &str) -> Result<Vec<Condition>, String> {
    FILTER_JOIN_RE
        .split(filter)
        .map(|term| parse_filter_term::<E>(term.trim()))
        .collect()
}

fn parse_filter_term<E: GradebookEntity>(term: &str) -> Result<Condition, String> {
    let captures = FILTER_TERM_RE
        .captures(term)
        .ok_or_else(|| format!("Invalid filter term: {term}"))?;
    let field = lookup_field::<E>(&captures[1])?;
    let op = FilterOp::parse(&captures[2]).ok_or_else(|| format!("Invalid filter term: {term}"))?;
    let raw = captures
        .get(3)
        .or_else(|| captures.get(4))
        .map_or("", |value| value.as_str());

    if op == FilterOp::Contains && field.kind != FieldKind::Text {
        return Err(format!("Operator ~ requires a text field: {}", field.name));
    }
    let operand = FieldValue::parse(field.kind, raw)
        .ok_or_else(|| format!("Invalid value for {}: {raw}", field.name))?;

    Ok(Condition { field, op, operand })
}

fn parse_sort<E: GradebookEntity>(sort: &str) -> Result<Vec<SortKey>, String> {
    sort.split(',')
        .map(str::trim)
        .map(|term| {
            let captures = SORT_KEY_RE
                .captures(term)
                .ok_or_else(|| format!("Invalid sort key: {term}"))?;
            let field = lookup_field::<E>(&captures[2])?;
            let direction = captures
                .get(3)
                .map(|direction| direction.as_str().to_ascii_uppercase());
            let descending = match (captures.get(1).is_some(), direction.as_deref()) {
                (false, None | Some("ASC")) => false,
                (true, None) | (false, Some("DESC")) => true,
                _ => return Err(format!("Invalid sort key: {term}")),
            };
            Ok(SortKey { field, descending })
        })
        .collect()
}

fn parse_fields<E: GradebookEntity>(fields: &str) -> Result<Vec<&'static str>, String> {
    let mut selected: Vec<&'static str> = ALWAYS_PROJECTED.to_vec();
    for name in fields.split(',').map(str::trim).filter(|name| !name.is_empty()) {
        let field = lookup_field::<E>(name)?;
        if !selected.contains(&field.name) {
            selected.push(field.name);
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::{FilterOp, ListQuery};
    use crate::model::{Category, CategoryPayload, FieldValue, LineItem};
    use crate::pagination::PageRequest;
    use rust_decimal::Decimal;
    use std::cmp::Ordering;

    fn parse(filter: Option<&str>, sort: Option<&str>) -> ListQuery<Category> {
        ListQuery::parse(PageRequest::default(), filter, sort, None).unwrap()
    }

    fn category(id: &str, title: &str, weight: Option<Decimal>) -> Category {
        Category::create(
            id,
            &CategoryPayload {
                title: Some(title.to_string()),
                weight,
                ..CategoryPayload::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn filter_terms_are_typed_by_field() {
        let query = parse(Some("title='Homework' AND weight>=0.25"), None);
        let conditions = query.conditions();
        assert_eq!(conditions.len(), 2);
        assert_eq!(conditions[0].field.column, "title");
        assert_eq!(conditions[0].op, FilterOp::Eq);
        assert_eq!(conditions[1].op, FilterOp::Ge);
        assert_eq!(
            conditions[1].operand,
            FieldValue::Decimal(Decimal::new(25, 2))
        );
    }

    #[test]
    fn filter_matches_and_skips_unset_values() {
        let query = parse(Some("weight<'0.5'"), None);
        assert!(query.matches(&category("c1", "A", Some(Decimal::new(3, 1)))));
        assert!(!query.matches(&category("c2", "B", Some(Decimal::new(8, 1)))));
        assert!(!query.matches(&category("c3", "C", None)));

        let contains = parse(Some("title~'work'"), None);
        assert!(contains.matches(&category("c4", "HomeWork", None)));
        assert!(!contains.matches(&category("c5", "Exam", None)));
    }

    #[test]
    fn rejected_terms_report_under_parameter_name() {
        let err = ListQuery::<Category>::parse(
            PageRequest::default(),
            Some("secret='x'"),
            Some("title SIDEWAYS"),
            Some("title,password"),
        )
        .unwrap_err();
        assert_eq!(err.get("filter"), Some("Unknown field: secret"));
        assert_eq!(err.get("sort"), Some("Invalid sort key: title SIDEWAYS"));
        assert_eq!(err.get("fields"), Some("Unknown field: password"));

        let err = ListQuery::<Category>::parse(
            PageRequest::default(),
            Some("weight~'1'"),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(
            err.get("filter"),
            Some("Operator ~ requires a text field: weight")
        );

        let err = ListQuery::<LineItem>::parse(
            PageRequest::default(),
            Some("dueDate<'soon'"),
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.get("filter"), Some("Invalid value for dueDate: soon"));
    }

    #[test]
    fn sort_keys_accept_suffix_and_prefix_forms() {
        let query = parse(None, Some("weight DESC, -title,sourcedId asc"));
        let keys = query.sort_keys();
        assert_eq!(keys.len(), 3);
        assert!(keys[0].descending);
        assert!(keys[1].descending);
        assert!(!keys[2].descending);

        let light = category("c1", "A", Some(Decimal::new(1, 1)));
        let heavy = category("c2", "B", Some(Decimal::new(9, 1)));
        assert_eq!(query.compare(&heavy, &light), Ordering::Less);
    }

    #[test]
    fn projection_keeps_identity_fields_first() {
        let query = ListQuery::<Category>::parse(
            PageRequest::default(),
            None,
            None,
            Some("title, status"),
        )
        .unwrap();
        assert_eq!(
            query.fields(),
            Some(&["sourcedId", "status", "dateLastModified", "title"][..])
        );
    }

    #[test]
    fn blank_parameters_are_absent() {
        let query = ListQuery::<Category>::parse(
            PageRequest::default(),
            Some("  "),
            Some(""),
            Some(" "),
        )
        .unwrap();
        assert!(query.conditions().is_empty());
        assert!(query.sort_keys().is_empty());
        assert_eq!(query.fields(), None);
    }
}
