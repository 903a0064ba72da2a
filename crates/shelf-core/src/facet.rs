//! Facet options: which values a column can still take.
//!
//! The options for a column are computed under every active filter *except*
//! the filters on that column, so the user can widen a column's selection
//! without being boxed in by the filter they are about to replace.
//!
//! Large stores are scanned in batches by [`FacetScan`]. The caller gets
//! control back between batches and the result only becomes visible once the
//! scan has covered every row.

use std::collections::HashSet;

use crate::{filter::FilterSet, store::RowStore};

pub const DEFAULT_FACET_BATCH_SIZE: usize = 1_000;

/// The engine state a facet scan was started for. A finished scan is only
/// published when its tag still equals the current one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FacetTag {
    pub session: u64,
    pub filters_version: u64,
    pub column: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacetResult {
    pub tag: FacetTag,
    /// Distinct non-empty values, in first-seen order.
    pub options: Vec<String>,
}

/// A resumable distinct-value scan over a [`RowStore`].
#[derive(Debug, Clone)]
pub struct FacetScan {
    tag: FacetTag,
    filters: FilterSet,
    batch_size: usize,
    cursor: usize,
    seen: HashSet<String>,
    options: Vec<String>,
}

impl FacetScan {
    pub fn new(store: &RowStore, column: &str, filters: &FilterSet, batch_size: usize) -> Self {
        Self {
            tag: FacetTag {
                session: store.session(),
                filters_version: filters.version(),
                column: column.to_owned(),
            },
            filters: filters.clone(),
            batch_size: batch_size.max(1),
            cursor: 0,
            seen: HashSet::new(),
            options: Vec::new(),
        }
    }

    pub fn tag(&self) -> &FacetTag {
        &self.tag
    }

    pub fn column(&self) -> &str {
        &self.tag.column
    }

    /// Rows examined so far.
    pub fn progress(&self) -> usize {
        self.cursor
    }

    /// Scan the next batch. Returns `true` once every row of `store` has been
    /// seen; rows appended in the meantime are picked up by later steps.
    pub fn step(&mut self, store: &RowStore) -> bool {
        let rows = store.rows();
        let start = self.cursor.min(rows.len());
        let end = start.saturating_add(self.batch_size).min(rows.len());
        let column = self.tag.column.as_str();

        for row in &rows[start..end] {
            if !self.filters.matches_except(row, column) {
                continue;
            }
            match row.get(column) {
                Some(value) if !value.is_empty() => {
                    if !self.seen.contains(value) {
                        self.seen.insert(value.to_owned());
                        self.options.push(value.to_owned());
                    }
                }
                _ => {}
            }
        }

        self.cursor = end;
        self.cursor >= rows.len()
    }

    pub fn is_finished(&self, store: &RowStore) -> bool {
        self.cursor >= store.len()
    }

    pub fn finish(self) -> FacetResult {
        FacetResult {
            tag: self.tag,
            options: self.options,
        }
    }

    /// Drive the scan to completion, yielding to the scheduler after every
    /// batch.
    pub async fn run(mut self, store: &RowStore) -> FacetResult {
        while !self.step(store) {
            tokio::task::yield_now().await;
        }
        self.finish()
    }
}

/// Distinct non-empty values of `column` over the rows that satisfy every
/// filter not on `column`, in first-seen order. Blocking single pass.
pub fn options_for(store: &RowStore, column: &str, filters: &FilterSet) -> Vec<String> {
    let mut scan = FacetScan::new(store, column, filters, usize::MAX);
    while !scan.step(store) {}
    scan.finish().options
}
