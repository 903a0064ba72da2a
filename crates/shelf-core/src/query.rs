//! Search, filter and sort over a [`RowStore`], producing a [`View`].
//!
//! A view is a list of row positions in the store, so deriving one never
//! copies or moves rows. The whole pipeline re-runs from the store whenever an
//! input changes; [`QueryPipeline`] only skips the work when nothing did.

use std::{cmp::Ordering, ops::Range};

use rayon::slice::ParallelSliceMut;
use serde::{Deserialize, Serialize};
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

use crate::{
    filter::FilterSet,
    store::{Row, RowStore},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Which column to sort by. `column: None` keeps the filtered order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn by(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: Some(column.into()),
            direction,
        }
    }

    /// Header-click behaviour: clicking the column that is currently sorted
    /// ascending switches it to descending, any other click sorts ascending.
    pub fn toggle(&mut self, column: &str) {
        let same = self.column.as_deref() == Some(column);
        self.direction = if same && self.direction == SortDirection::Ascending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        self.column = Some(column.to_owned());
    }
}

/// Parse the longest leading decimal number of `s`, ignoring leading
/// whitespace, the way spreadsheet-ish inputs such as `"12.5 TL"` or `"4.3/5"`
/// are usually meant. Returns `None` when `s` does not start with a number.
pub fn parse_leading_float(s: &str) -> Option<f64> {
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    if s[end..].starts_with("Infinity") {
        return Some(if bytes[0] == b'-' {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    s[..end].parse().ok()
}

/// Pre-computed comparison key for one cell.
#[derive(Debug, Clone)]
struct SortKey<'a> {
    text: &'a str,
    /// Lower-cased base letters, accents removed.
    primary: String,
    /// Lower-cased, accents kept (canonically decomposed).
    folded: String,
    number: Option<f64>,
}

impl<'a> SortKey<'a> {
    fn new(text: &'a str) -> Self {
        let folded: String = text.to_lowercase().nfd().collect();
        let primary = folded
            .chars()
            .filter(|c| !is_combining_mark(*c))
            .map(|c| if c == 'ı' { 'i' } else { c })
            .collect();
        Self {
            text,
            primary,
            folded,
            number: parse_leading_float(text),
        }
    }
}

/// Human-oriented string order: base letters first (`Ç` files with `c`,
/// `é` with `e`), then unaccented before accented, and on a remaining tie the
/// lower-case spelling sorts before the upper-case one.
#[inline]
fn locale_cmp(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    a.primary
        .cmp(&b.primary)
        .then_with(|| a.folded.cmp(&b.folded))
        .then_with(|| b.text.cmp(a.text))
}

/// Numeric when both sides parse as numbers, string order otherwise.
#[inline]
fn dual_cmp(a: &SortKey<'_>, b: &SortKey<'_>) -> Ordering {
    match (a.number, b.number) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => locale_cmp(a, b),
    }
}

/// Compare two cell values with the same rules the view sort uses.
pub fn compare_cells(a: &str, b: &str) -> Ordering {
    dual_cmp(&SortKey::new(a), &SortKey::new(b))
}

/// Does any cell of `row` contain `needle`? `needle` must already be
/// lower-cased.
#[inline]
fn row_contains(row: &Row, needle: &str) -> bool {
    row.values().any(|v| v.to_lowercase().contains(needle))
}

/// Ordered positions into a [`RowStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    rows: Vec<usize>,
}

impl View {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Store positions, in view order.
    pub fn positions(&self) -> &[usize] {
        &self.rows
    }

    /// The row at view position `index`.
    #[inline]
    pub fn row<'s>(&self, store: &'s RowStore, index: usize) -> Option<&'s Row> {
        self.rows.get(index).and_then(|&pos| store.get(pos))
    }

    pub fn rows<'s>(&self, store: &'s RowStore) -> impl Iterator<Item = &'s Row> {
        self.rows.iter().filter_map(move |&pos| store.get(pos))
    }

    /// Rows for a range of view positions, clamped to the view.
    pub fn slice<'s>(&self, store: &'s RowStore, range: Range<usize>) -> Vec<&'s Row> {
        let end = range.end.min(self.rows.len());
        let start = range.start.min(end);
        self.rows[start..end]
            .iter()
            .filter_map(|&pos| store.get(pos))
            .collect()
    }
}

/// Apply search, filters and sort to the store.
///
/// Search and filters are conjunctive. The sort is stable, so ties keep the
/// filtered order, which is ingestion order.
pub fn derive_view(store: &RowStore, search: &str, filters: &FilterSet, sort: &SortSpec) -> View {
    let needle = search.to_lowercase();

    let mut rows: Vec<usize> = store
        .rows()
        .iter()
        .enumerate()
        .filter(|(_, row)| needle.is_empty() || row_contains(row, &needle))
        .filter(|(_, row)| filters.matches(row))
        .map(|(pos, _)| pos)
        .collect();

    if let Some(column) = sort.column.as_deref() {
        let mut keyed: Vec<(usize, SortKey<'_>)> = rows
            .iter()
            .map(|&pos| {
                let text = store.get(pos).and_then(|r| r.get(column)).unwrap_or("");
                (pos, SortKey::new(text))
            })
            .collect();

        let descending = sort.direction == SortDirection::Descending;
        // par_sort_by is a stable merge sort
        keyed.par_sort_by(|(_, a), (_, b)| {
            let o = dual_cmp(a, b);
            if descending { o.reverse() } else { o }
        });
        rows = keyed.into_iter().map(|(pos, _)| pos).collect();
    }

    View { rows }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewKey {
    session: u64,
    rows: usize,
    search: String,
    filters_version: u64,
    sort: SortSpec,
}

/// Memoizing wrapper around [`derive_view`].
#[derive(Debug, Default)]
pub struct QueryPipeline {
    key: Option<ViewKey>,
    view: View,
}

impl QueryPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute the view unless every input is identical to the last run.
    /// Returns `true` when the view was recomputed.
    pub fn refresh(
        &mut self,
        store: &RowStore,
        search: &str,
        filters: &FilterSet,
        sort: &SortSpec,
    ) -> bool {
        let key = ViewKey {
            session: store.session(),
            rows: store.len(),
            search: search.to_owned(),
            filters_version: filters.version(),
            sort: sort.clone(),
        };
        if self.key.as_ref() == Some(&key) {
            return false;
        }

        self.view = derive_view(store, search, filters, sort);
        tracing::debug!(
            rows = store.len(),
            view = self.view.len(),
            search,
            filters = filters.len(),
            sort = ?sort.column,
            "view recomputed"
        );
        self.key = Some(key);
        true
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Forget the cached inputs so the next refresh recomputes.
    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
