use std::{collections::BTreeSet, fmt, sync::Arc};

use itertools::Itertools;

use crate::store::Row;

/// An equality constraint: the row's cell for `column` must be one of `values`.
///
/// The accepted values are frozen behind an `Arc` when the filter is built, so
/// a filter can be shared with a facet scan or a display without anyone being
/// able to edit it in place. Changing a filter means removing it and adding a
/// new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    column: String,
    values: Arc<BTreeSet<String>>,
}

impl Filter {
    /// Returns `None` when `values` is empty; such a filter is never stored.
    pub fn new<I, S>(column: impl Into<String>, values: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: BTreeSet<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return None;
        }
        Some(Self {
            column: column.into(),
            values: Arc::new(values),
        })
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn values(&self) -> &BTreeSet<String> {
        &self.values
    }

    /// A row satisfies the filter iff its cell is present and accepted.
    #[inline]
    pub fn matches(&self, row: &Row) -> bool {
        row.get(&self.column)
            .is_some_and(|value| self.values.contains(value))
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.column, self.values.iter().join(", "))
    }
}

/// Ordered, conjunctive list of filters.
///
/// `version` changes on every mutation and is the identity used by the query
/// cache and by facet scans to detect that they were computed for an older
/// filter set.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: Vec<Filter>,
    version: u64,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a filter on `column`. An empty value set is dropped and `false`
    /// is returned.
    pub fn add<I, S>(&mut self, column: impl Into<String>, values: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match Filter::new(column, values) {
            Some(filter) => {
                self.push(filter);
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
        self.bump();
    }

    /// Remove the filter at `index`. Out-of-range indices are ignored.
    pub fn remove(&mut self, index: usize) -> Option<Filter> {
        if index >= self.filters.len() {
            return None;
        }
        let removed = self.filters.remove(index);
        self.bump();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.filters.clear();
        self.bump();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Filter> {
        self.filters.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Filter> {
        self.filters.get(index)
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Empty set matches every row.
    #[inline]
    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }

    /// Like [`FilterSet::matches`] but ignoring every filter on `column`.
    #[inline]
    pub fn matches_except(&self, row: &Row, column: &str) -> bool {
        self.filters
            .iter()
            .filter(|f| f.column != column)
            .all(|f| f.matches(row))
    }

    fn bump(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}
