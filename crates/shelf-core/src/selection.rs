use std::{collections::BTreeSet, ops::Range};

use crate::{
    query::View,
    store::{Row, RowStore},
};

/// Selected rows, addressed by global index: the position in the current
/// filtered and sorted view.
///
/// Indices survive page turns. They are not remapped when search, filters or
/// sort change, so the same index may then name a different row. Indices that
/// no longer exist in the view are skipped at export time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    indices: BTreeSet<usize>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `index`. Returns whether it is now selected.
    pub fn toggle(&mut self, index: usize) -> bool {
        if self.indices.remove(&index) {
            false
        } else {
            self.indices.insert(index);
            true
        }
    }

    pub fn insert(&mut self, index: usize) -> bool {
        self.indices.insert(index)
    }

    pub fn remove(&mut self, index: usize) -> bool {
        self.indices.remove(&index)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    /// True when the page is non-empty and every index on it is selected.
    pub fn is_page_selected(&self, mut page: Range<usize>) -> bool {
        !page.is_empty() && page.all(|i| self.indices.contains(&i))
    }

    /// If the whole page is selected, deselect exactly the page; otherwise
    /// select every row on it.
    pub fn toggle_page(&mut self, page: Range<usize>) {
        if self.is_page_selected(page.clone()) {
            for i in page {
                self.indices.remove(&i);
            }
        } else {
            self.indices.extend(page);
        }
    }

    /// Selected rows of `view`, in ascending index order.
    pub fn export<'s>(&self, view: &View, store: &'s RowStore) -> Vec<&'s Row> {
        self.indices
            .iter()
            .filter_map(|&i| view.row(store, i))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }
}
