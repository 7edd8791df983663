//! Search Filters
//!
//! Composable row predicates for the find operation. A criteria vector
//! carries one optional slot per field; `None` (or an empty string)
//! means "don't care". Filter stages compose by logical AND: a row must
//! pass every stage to be accepted.

use crate::row::Row;

/// How the per-field criteria combine within one filter stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Every non-empty criterion must match its field
    And,
    /// At least one non-empty criterion must match its field
    Or,
}

/// One filter stage in the search pipeline
pub trait RowFilter: Send + Sync {
    fn accepts(&self, criteria: &[Option<String>], row: &Row, mode: MatchMode) -> bool;
}

/// First-stage filter: tombstoned rows are always rejected, whatever
/// the criteria say
pub struct LiveRows;

impl RowFilter for LiveRows {
    fn accepts(&self, _criteria: &[Option<String>], row: &Row, _mode: MatchMode) -> bool {
        row.is_live()
    }
}

/// Case-insensitive prefix match of each criterion against its field
///
/// A row whose field count differs from the criteria length is rejected
/// outright. An all-empty criteria vector matches everything.
pub struct StartsWith;

impl RowFilter for StartsWith {
    fn accepts(&self, criteria: &[Option<String>], row: &Row, mode: MatchMode) -> bool {
        if row.fields().len() != criteria.len() {
            return false;
        }

        if criteria.iter().all(is_blank) {
            return true;
        }

        match mode {
            MatchMode::Or => criteria.iter().enumerate().any(|(i, slot)| {
                slot.as_deref()
                    .map(|prefix| prefix_match(&row.fields()[i], prefix))
                    .unwrap_or(false)
            }),
            MatchMode::And => criteria.iter().enumerate().all(|(i, slot)| {
                slot.as_deref()
                    .map(|prefix| prefix_match(&row.fields()[i], prefix))
                    .unwrap_or(true)
            }),
        }
    }
}

/// A fixed pipeline of filter stages, AND-composed
pub struct FilterChain {
    filters: Vec<Box<dyn RowFilter>>,
}

impl FilterChain {
    pub fn new(filters: Vec<Box<dyn RowFilter>>) -> Self {
        Self { filters }
    }

    /// The standard search pipeline: drop tombstones, then prefix-match
    pub fn standard() -> Self {
        Self::new(vec![Box::new(LiveRows), Box::new(StartsWith)])
    }

    /// True when the row passes every stage
    pub fn accepts(&self, criteria: &[Option<String>], row: &Row, mode: MatchMode) -> bool {
        self.filters
            .iter()
            .all(|filter| filter.accepts(criteria, row, mode))
    }

    /// Keep the rows that pass every stage, preserving their order
    pub fn matching(&self, criteria: &[Option<String>], rows: Vec<Row>, mode: MatchMode) -> Vec<Row> {
        rows.into_iter()
            .filter(|row| self.accepts(criteria, row, mode))
            .collect()
    }
}

fn is_blank(slot: &Option<String>) -> bool {
    slot.as_deref().map(str::is_empty).unwrap_or(true)
}

fn prefix_match(value: &str, prefix: &str) -> bool {
    value.to_lowercase().starts_with(&prefix.to_lowercase())
}
