//! Offset/limit listing contract.
//!
//! # Invariants
//! - `limit >= 1`; `offset` and `limit` are non-negative.
//! - The page index is `offset / limit` and a page starts at
//!   `page_index * limit`, so offsets inside a page snap down to its start.
//! - Without sort keys, ordering is creation sequence, stable across calls.

use crate::model::validation::ValidationErrors;

pub const DEFAULT_OFFSET: u32 = 0;
pub const DEFAULT_LIMIT: u32 = 100;

/// Validated listing window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    offset: u32,
    limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: DEFAULT_OFFSET,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(offset: u32, limit: u32) -> Result<Self, ValidationErrors> {
        if limit == 0 {
            return Err(ValidationErrors::single("limit", "Limit must be at least 1"));
        }
        Ok(Self { offset, limit })
    }

    /// Builds a request from raw query parameters, applying defaults.
    pub fn from_params(offset: Option<i64>, limit: Option<i64>) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let offset = non_negative("offset", offset, DEFAULT_OFFSET, &mut errors);
        let limit = non_negative("limit", limit, DEFAULT_LIMIT, &mut errors);
        errors.into_result()?;
        Self::new(offset, limit)
    }

    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn page_index(&self) -> u32 {
        self.offset / self.limit
    }

    /// Zero-based position of the first row on this page.
    pub fn start(&self) -> u64 {
        u64::from(self.page_index()) * u64::from(self.limit)
    }

    /// Cuts this page out of an already ordered sequence.
    pub fn slice<'a, T: 'a + Clone>(&self, ordered: impl IntoIterator<Item = &'a T>) -> Vec<T> {
        let start = usize::try_from(self.start()).unwrap_or(usize::MAX);
        ordered
            .into_iter()
            .skip(start)
            .take(self.limit as usize)
            .cloned()
            .collect()
    }
}

fn non_negative(field: &str, value: Option<i64>, default: u32, errors: &mut ValidationErrors) -> u32 {
    match value {
        None => default,
        Some(value) if value < 0 => {
            errors.add(field, format!("{} must not be negative", capitalize(field)));
            default
        }
        Some(value) => u32::try_from(value).unwrap_or(u32::MAX),
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// One listing page plus the unfiltered-by-window total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub request: PageRequest,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        Self {
            items,
            total_count,
            request,
        }
    }
}
