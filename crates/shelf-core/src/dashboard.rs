//! The dashboard controller.
//!
//! [`Dashboard`] owns the row store and every piece of interactive state
//! derived from it (search, filters, sort, paging, selection, facets and the
//! render window). Each mutating call re-runs the query pipeline before it
//! returns, so readers always see a view consistent with the inputs.

use std::{
    collections::BTreeSet,
    fs::File,
    io,
    ops::Range,
    path::Path,
    time::Instant,
};

use tracing::{debug, error, info, warn};

use crate::{
    config::DashboardConfig,
    debounce::Debouncer,
    error::{Error, Result},
    facet::{FacetResult, FacetScan, FacetTag},
    filter::{Filter, FilterSet},
    ingest::CsvChunks,
    page::PageWindow,
    query::{QueryPipeline, SortSpec, View},
    selection::SelectionSet,
    sink::{ColumnMapping, ProductRecord},
    store::{Chunk, Row, RowStore},
    virtual_window::{RenderRange, VirtualRow, VirtualWindow},
};

/// Where the current ingestion session stands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Empty,
    Loading,
    Loaded {
        rows: usize,
    },
    /// The source failed after `rows` rows were committed. Those rows stay
    /// usable until the next load.
    Failed {
        rows: usize,
        message: String,
    },
}

#[derive(Debug, Default)]
struct FacetState {
    column: Option<String>,
    options: Vec<String>,
    picked: BTreeSet<String>,
    scan: Option<FacetScan>,
}

#[derive(Debug)]
pub struct Dashboard {
    config: DashboardConfig,
    store: RowStore,
    filters: FilterSet,
    search: String,
    search_input: Debouncer<String>,
    sort: SortSpec,
    pipeline: QueryPipeline,
    page: PageWindow,
    selection: SelectionSet,
    window: VirtualWindow,
    facet: FacetState,
    load_state: LoadState,
    last_view_len: usize,
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(DashboardConfig::default())
    }
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            search_input: Debouncer::new(config.search_debounce()),
            page: PageWindow::new(config.page_size),
            window: VirtualWindow::new(config.row_height, config.overscan),
            config,
            store: RowStore::new(),
            filters: FilterSet::new(),
            search: String::new(),
            sort: SortSpec::none(),
            pipeline: QueryPipeline::new(),
            selection: SelectionSet::new(),
            facet: FacetState::default(),
            load_state: LoadState::Empty,
            last_view_len: 0,
        }
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn columns(&self) -> &[String] {
        self.store.columns()
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    // ---- ingestion ----

    /// Start a new session: drop the rows and every piece of state derived
    /// from them. The sort column is kept.
    pub fn begin_load(&mut self) {
        self.store.reset();
        self.filters.clear();
        self.selection.clear();
        self.search.clear();
        self.search_input.cancel();
        self.facet = FacetState::default();
        self.page.reset();
        self.window.scroll_to(0.0);
        self.pipeline.invalidate();
        self.load_state = LoadState::Loading;
        self.recompute();
    }

    /// Append a decoded chunk to the current session.
    pub fn ingest_chunk(&mut self, chunk: Chunk) -> usize {
        let added = self.store.ingest_chunk(chunk);
        if added > 0 {
            self.recompute();
        }
        added
    }

    /// Mark the current session as complete.
    pub fn finish_load(&mut self) {
        self.load_state = LoadState::Loaded {
            rows: self.store.len(),
        };
    }

    /// Replace the data with the CSV read from `rdr`, yielding to the
    /// scheduler after every chunk.
    ///
    /// On a decode error the rows ingested so far are kept, the session is
    /// marked [`LoadState::Failed`] and [`Error::Ingest`] is returned.
    pub async fn load_csv<R: io::Read>(&mut self, rdr: R) -> Result<usize> {
        self.begin_load();
        for chunk in CsvChunks::new(rdr, self.config.chunk_size) {
            match chunk {
                Ok(chunk) => {
                    let added = self.ingest_chunk(chunk);
                    debug!(added, total = self.store.len(), "chunk ingested");
                    tokio::task::yield_now().await;
                }
                Err(source) => {
                    let rows = self.store.len();
                    error!(rows, error = %source, "CSV ingestion failed");
                    self.load_state = LoadState::Failed {
                        rows,
                        message: source.to_string(),
                    };
                    return Err(Error::Ingest { rows, source });
                }
            }
        }
        self.finish_load();
        info!(
            rows = self.store.len(),
            columns = self.store.columns().len(),
            "CSV loaded"
        );
        Ok(self.store.len())
    }

    /// [`Dashboard::load_csv`] from a file. A file that cannot be opened
    /// leaves the current session untouched.
    pub async fn load_path<P: AsRef<Path>>(&mut self, path: P) -> Result<usize> {
        let file = File::open(path)?;
        self.load_csv(file).await
    }

    // ---- query inputs ----

    pub fn search(&self) -> &str {
        &self.search
    }

    /// Apply a search string immediately, dropping any pending input.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.search = text.into();
        self.search_input.cancel();
        self.recompute();
    }

    /// Record raw search input; it takes effect on a later [`Dashboard::tick`]
    /// once the input has been quiet for the debounce delay.
    pub fn set_search_input(&mut self, text: impl Into<String>, now: Instant) {
        self.search_input.push(text.into(), now);
    }

    /// Apply debounced search input that is due. Returns whether the search
    /// changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.search_input.poll(now) {
            Some(text) => {
                self.search = text;
                self.recompute();
                true
            }
            None => false,
        }
    }

    pub fn search_deadline(&self) -> Option<Instant> {
        self.search_input.deadline()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// Add a filter. An empty value set is dropped and `false` returned.
    pub fn add_filter<I, S>(&mut self, column: impl Into<String>, values: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.filters.add(column, values) {
            return false;
        }
        self.after_filter_change();
        true
    }

    /// Remove the filter at `index`; out-of-range is a no-op.
    pub fn remove_filter(&mut self, index: usize) -> Option<Filter> {
        let removed = self.filters.remove(index)?;
        self.after_filter_change();
        Some(removed)
    }

    fn after_filter_change(&mut self) {
        self.facet = FacetState::default();
        self.page.reset();
        self.recompute();
    }

    pub fn sort(&self) -> &SortSpec {
        &self.sort
    }

    pub fn set_sort(&mut self, sort: SortSpec) {
        self.sort = sort;
        self.recompute();
    }

    /// Header click on `column`.
    pub fn toggle_sort(&mut self, column: &str) {
        self.sort.toggle(column);
        self.recompute();
    }

    /// Re-run the query pipeline if any input changed, and go back to the
    /// first page when the number of matching rows changed.
    pub fn recompute(&mut self) {
        self.pipeline
            .refresh(&self.store, &self.search, &self.filters, &self.sort);
        let len = self.pipeline.view().len();
        if len != self.last_view_len {
            self.last_view_len = len;
            self.page.reset();
            self.window.scroll_to(0.0);
        }
    }

    // ---- view and paging ----

    pub fn view(&self) -> &View {
        self.pipeline.view()
    }

    pub fn view_len(&self) -> usize {
        self.view().len()
    }

    pub fn page(&self) -> usize {
        self.page.page()
    }

    pub fn page_size(&self) -> usize {
        self.page.page_size()
    }

    pub fn page_count(&self) -> usize {
        self.page.page_count(self.view_len())
    }

    /// Global view indices of the current page.
    pub fn page_range(&self) -> Range<usize> {
        self.page.range(self.view_len())
    }

    pub fn page_rows(&self) -> Vec<&Row> {
        self.view().slice(&self.store, self.page_range())
    }

    pub fn next_page(&mut self) -> bool {
        let moved = self.page.next(self.view_len());
        if moved {
            self.window.scroll_to(0.0);
        }
        moved
    }

    pub fn prev_page(&mut self) -> bool {
        let moved = self.page.prev();
        if moved {
            self.window.scroll_to(0.0);
        }
        moved
    }

    pub fn goto_page(&mut self, page: usize) {
        self.page.goto(page, self.view_len());
        self.window.scroll_to(0.0);
    }

    /// `Showing X of Y rows`, with ` (Z selected)` appended when anything is
    /// selected.
    pub fn summary(&self) -> String {
        let mut line = format!(
            "Showing {} of {} rows",
            self.page_range().len(),
            self.view_len()
        );
        if !self.selection.is_empty() {
            line.push_str(&format!(" ({} selected)", self.selection.len()));
        }
        line
    }

    // ---- render window ----

    pub fn render_range(&self) -> RenderRange {
        self.window.range(self.page_range().len())
    }

    /// Rows of the current page that should be materialized right now.
    pub fn visible_rows(&self) -> Vec<(VirtualRow, &Row)> {
        self.window
            .rows(self.page_range())
            .filter_map(|vr| self.view().row(&self.store, vr.global).map(|row| (vr, row)))
            .collect()
    }

    pub fn scroll_to(&mut self, offset: f32) {
        self.window.scroll_to(offset);
    }

    pub fn resize_viewport(&mut self, height: f32) {
        self.window.resize(height);
    }

    pub fn virtual_window(&self) -> &VirtualWindow {
        &self.window
    }

    // ---- selection ----

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    /// Toggle the row at page-local position `local`. Returns whether it is
    /// now selected, or `None` when the page has no such row.
    pub fn toggle_row(&mut self, local: usize) -> Option<bool> {
        let range = self.page_range();
        let global = range.start.checked_add(local)?;
        range
            .contains(&global)
            .then(|| self.selection.toggle(global))
    }

    pub fn toggle_global(&mut self, index: usize) -> bool {
        self.selection.toggle(index)
    }

    pub fn select_global(&mut self, index: usize) -> bool {
        self.selection.insert(index)
    }

    pub fn toggle_page(&mut self) {
        self.selection.toggle_page(self.page_range());
    }

    pub fn is_page_selected(&self) -> bool {
        self.selection.is_page_selected(self.page_range())
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Selected rows in ascending view order.
    pub fn export_selected(&self) -> Vec<&Row> {
        self.selection.export(self.view(), &self.store)
    }

    /// Owned product records of the selected rows, detached from the engine.
    pub fn selected_records(&self, mapping: &ColumnMapping) -> Vec<ProductRecord> {
        self.export_selected()
            .into_iter()
            .map(|row| ProductRecord::from_row(row, mapping))
            .collect()
    }

    // ---- facets ----

    pub fn facet_column(&self) -> Option<&str> {
        self.facet.column.as_deref()
    }

    /// The last published options of the facet column.
    pub fn facet_options(&self) -> &[String] {
        &self.facet.options
    }

    pub fn picked_values(&self) -> &BTreeSet<String> {
        &self.facet.picked
    }

    pub fn facet_scan_pending(&self) -> bool {
        self.facet.scan.is_some()
    }

    /// Start listing the options of `column`. Supersedes any scan in flight
    /// and clears the picked values.
    pub fn select_facet_column(&mut self, column: impl Into<String>) {
        let column = column.into();
        let scan = FacetScan::new(
            &self.store,
            &column,
            &self.filters,
            self.config.facet_batch_size,
        );
        if self.facet.scan.is_some() {
            debug!(column = %column, "superseding facet scan");
        }
        self.facet = FacetState {
            column: Some(column),
            options: Vec::new(),
            picked: BTreeSet::new(),
            scan: Some(scan),
        };
    }

    /// Identity of the facet state that a scan result must match to be shown.
    pub fn current_facet_tag(&self) -> Option<FacetTag> {
        self.facet.column.as_ref().map(|column| FacetTag {
            session: self.store.session(),
            filters_version: self.filters.version(),
            column: column.clone(),
        })
    }

    /// Run one batch of the pending facet scan, publishing it when complete.
    /// Returns `true` once no scan is pending.
    pub fn pump_facet(&mut self) -> bool {
        let Some(scan) = self.facet.scan.as_mut() else {
            return true;
        };
        if !scan.step(&self.store) {
            return false;
        }
        if let Some(scan) = self.facet.scan.take() {
            self.publish_facet(scan.finish());
        }
        true
    }

    /// Drive the pending facet scan to completion, yielding between batches.
    pub async fn settle_facets(&mut self) {
        while !self.pump_facet() {
            tokio::task::yield_now().await;
        }
    }

    /// Show `result` if it was computed for the current state; otherwise drop
    /// it. Returns whether it was shown.
    pub fn publish_facet(&mut self, result: FacetResult) -> bool {
        if self.current_facet_tag().as_ref() != Some(&result.tag) {
            warn!(column = %result.tag.column, "discarding stale facet result");
            return false;
        }
        debug!(
            column = %result.tag.column,
            options = result.options.len(),
            "facet options published"
        );
        self.facet.options = result.options;
        true
    }

    /// Toggle `value` among the picked facet values. Returns whether it is now
    /// picked.
    pub fn pick_facet_value(&mut self, value: impl Into<String>) -> bool {
        let value = value.into();
        if self.facet.picked.remove(&value) {
            false
        } else {
            self.facet.picked.insert(value);
            true
        }
    }

    /// Turn the facet column and picked values into a filter. Nothing happens
    /// without a column or with no picked value.
    pub fn add_filter_from_selection(&mut self) -> bool {
        let Some(column) = self.facet.column.clone() else {
            return false;
        };
        let picked = std::mem::take(&mut self.facet.picked);
        if picked.is_empty() {
            return false;
        }
        self.add_filter(column, picked)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::query::SortDirection;

    fn rows(n: usize) -> Chunk {
        Chunk::new(
            (0..n)
                .map(|i| {
                    Row::from_pairs([
                        ("id".to_owned(), i.to_string()),
                        ("parity".to_owned(), if i % 2 == 0 { "even" } else { "odd" }.to_owned()),
                    ])
                })
                .collect(),
        )
    }

    fn dashboard(n: usize) -> Dashboard {
        let mut d = Dashboard::new(DashboardConfig::builder().page_size(10).facet_batch_size(7).build());
        d.begin_load();
        d.ingest_chunk(rows(n));
        d.finish_load();
        d
    }

    fn ids(rows: &[&Row]) -> Vec<String> {
        rows.iter()
            .map(|r| r.get("id").unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn test_paging_and_summary() {
        let mut d = dashboard(25);
        assert_eq!(d.page_count(), 3);
        assert_eq!(d.summary(), "Showing 10 of 25 rows");
        assert!(d.next_page());
        assert!(d.next_page());
        assert!(!d.next_page());
        assert_eq!(d.page_range(), 20..25);
        d.goto_page(99);
        assert_eq!(d.page(), 3);
        d.toggle_page();
        assert_eq!(d.summary(), "Showing 5 of 25 rows (5 selected)");
    }

    #[test]
    fn test_view_len_change_resets_page() {
        let mut d = dashboard(25);
        d.goto_page(3);
        d.set_sort(SortSpec::by("id", SortDirection::Descending));
        assert_eq!(d.page(), 3);
        d.add_filter("parity", ["odd"]);
        assert_eq!(d.page(), 1);
        assert_eq!(d.view_len(), 12);
    }

    #[test]
    fn test_toggle_row_translates_page_local_index() {
        let mut d = dashboard(25);
        d.next_page();
        assert_eq!(d.toggle_row(3), Some(true));
        assert!(d.selection().contains(13));
        assert_eq!(d.toggle_row(10), None);
        assert_eq!(d.toggle_row(3), Some(false));
        assert!(d.selection().is_empty());
    }

    #[test]
    fn test_debounced_search() {
        let mut d = dashboard(25);
        let t0 = Instant::now();
        d.set_search_input("1", t0);
        d.set_search_input("12", t0 + Duration::from_millis(200));
        assert!(!d.tick(t0 + Duration::from_millis(400)));
        assert_eq!(d.view_len(), 25);
        assert!(d.tick(t0 + Duration::from_millis(500)));
        assert_eq!(d.search(), "12");
        assert_eq!(ids(&d.page_rows()), ["12"]);
    }

    #[test]
    fn test_begin_load_resets_state() {
        let mut d = dashboard(25);
        d.add_filter("parity", ["even"]);
        d.set_search("1");
        d.toggle_global(0);
        d.select_facet_column("id");
        d.set_search_input("pending", Instant::now());

        d.begin_load();
        assert!(d.filters().is_empty());
        assert!(d.selection().is_empty());
        assert_eq!(d.search(), "");
        assert!(d.search_deadline().is_none());
        assert!(d.facet_column().is_none());
        assert_eq!(d.view_len(), 0);
        assert_eq!(d.load_state(), &LoadState::Loading);
    }

    #[test]
    fn test_facet_scan_publish_and_filter() {
        let mut d = dashboard(25);
        d.select_facet_column("parity");
        assert!(d.facet_options().is_empty());
        let mut steps = 1;
        while !d.pump_facet() {
            steps += 1;
        }
        assert_eq!(steps, 4);
        assert_eq!(d.facet_options(), ["even", "odd"]);

        assert!(d.pick_facet_value("odd"));
        assert!(d.add_filter_from_selection());
        assert_eq!(d.view_len(), 12);
        assert!(d.facet_column().is_none());
        assert!(d.picked_values().is_empty());
    }

    #[test]
    fn test_add_filter_from_selection_needs_values() {
        let mut d = dashboard(5);
        assert!(!d.add_filter_from_selection());
        d.select_facet_column("parity");
        assert!(!d.add_filter_from_selection());
        assert!(d.filters().is_empty());
    }

    #[test]
    fn test_stale_facet_result_is_discarded() {
        let mut d = dashboard(25);
        d.select_facet_column("parity");
        let mut stale = FacetScan::new(d.store(), "parity", d.filters(), 100);
        stale.step(d.store());

        d.add_filter("id", ["1", "2"]);
        d.select_facet_column("parity");
        assert!(!d.publish_facet(stale.finish()));
        assert!(d.facet_options().is_empty());

        d.select_facet_column("id");
        let mut other_column = FacetScan::new(d.store(), "parity", d.filters(), 100);
        other_column.step(d.store());
        assert!(!d.publish_facet(other_column.finish()));
    }

    #[tokio::test]
    async fn test_settle_facets() {
        let mut d = dashboard(25);
        d.add_filter("parity", ["odd"]);
        d.select_facet_column("parity");
        d.settle_facets().await;
        assert!(!d.facet_scan_pending());
        assert_eq!(d.facet_options(), ["even", "odd"]);
    }

    #[tokio::test]
    async fn test_load_csv() {
        let mut d = Dashboard::default();
        let n = d.load_csv("name,brand\na,X\nb,Y\n".as_bytes()).await.unwrap();
        assert_eq!(n, 2);
        assert_eq!(d.columns(), ["name", "brand"]);
        assert_eq!(d.load_state(), &LoadState::Loaded { rows: 2 });
    }

    #[test]
    fn test_visible_rows_carry_global_index() {
        let mut d = Dashboard::new(
            DashboardConfig::builder()
                .page_size(100)
                .overscan(0)
                .row_height(10.0)
                .build(),
        );
        d.begin_load();
        d.ingest_chunk(rows(250));
        d.next_page();
        d.resize_viewport(50.0);
        d.scroll_to(200.0);
        let visible = d.visible_rows();
        assert_eq!(visible.len(), 5);
        assert_eq!(visible[0].0.local, 20);
        assert_eq!(visible[0].0.global, 120);
        assert_eq!(visible[0].1.get("id"), Some("120"));
    }

    #[test]
    fn test_page_actions_cover_rows_outside_render_window() {
        let mut d = Dashboard::new(
            DashboardConfig::builder()
                .page_size(200)
                .overscan(2)
                .row_height(10.0)
                .build(),
        );
        d.begin_load();
        d.ingest_chunk(rows(250));
        d.finish_load();
        d.resize_viewport(50.0);
        d.scroll_to(500.0);

        let rendered = d.render_range();
        assert!(rendered.len() < 200);
        assert!(rendered.start > 0);

        d.toggle_page();
        assert_eq!(d.selection().len(), 200);
        assert!((0..200).all(|i| d.selection().contains(i)));
        assert!(d.selection().contains(0));
        assert!(d.selection().contains(199));
        assert!(!d.selection().contains(200));
        assert!(d.is_page_selected());

        d.set_sort(SortSpec::by("id", SortDirection::Descending));
        assert_eq!(d.page_rows().len(), 200);
        assert_eq!(d.page_range(), 0..200);
        assert_eq!(d.virtual_window().scroll_offset(), 500.0);
        assert_eq!(d.export_selected().len(), 200);
    }
}
