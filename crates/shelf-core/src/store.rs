use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One decoded CSV record: an ordered mapping from column name to cell text.
///
/// Column names are shared `Arc<str>` handles so a million rows of the same
/// file do not carry a million copies of the header. An empty cell (`""`) is a
/// present value; a column missing from the mapping is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(Arc<str>, String)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cells: Vec::with_capacity(capacity),
        }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut row = Row::new();
        for (column, value) in pairs {
            row.insert(Arc::from(column.as_ref()), value);
        }
        row
    }

    /// Set `column` to `value`, keeping the column's original position when it
    /// already exists.
    pub fn insert(&mut self, column: Arc<str>, value: impl Into<String>) {
        let value = value.into();
        match self.cells.iter_mut().find(|(c, _)| *c == column) {
            Some((_, slot)) => *slot = value,
            None => self.cells.push((column, value)),
        }
    }

    #[inline]
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(c, _)| &**c == column)
            .map(|(_, v)| v.as_str())
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(c, _)| &**c)
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells.iter().map(|(c, v)| (&**c, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

// Serialized as a JSON object in column order.
impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (column, value) in &self.cells {
            map.serialize_entry(&**column, value)?;
        }
        map.end()
    }
}

/// A batch of decoded rows as handed over by the CSV decoder. Only the first
/// chunk of a session carries the header list.
#[derive(Debug, Clone, Default)]
pub struct Chunk {
    pub columns: Option<Vec<String>>,
    pub rows: Vec<Row>,
}

impl Chunk {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            columns: None,
            rows,
        }
    }

    pub fn with_columns(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self {
            columns: Some(columns),
            rows,
        }
    }
}

/// Append-only row storage for one ingestion session.
///
/// Rows stay in ingestion order forever; sorting and filtering produce
/// index views over this storage and never move rows.
#[derive(Debug, Default)]
pub struct RowStore {
    columns: Vec<String>,
    rows: Vec<Row>,
    session: u64,
}

impl RowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return the number of rows added.
    ///
    /// The first non-empty chunk fixes the column list, taken from the chunk's
    /// header when present and from the first row's keys otherwise. Columns
    /// that show up later are not retrofitted onto earlier rows.
    pub fn ingest_chunk(&mut self, chunk: Chunk) -> usize {
        if chunk.rows.is_empty() {
            return 0;
        }

        if self.columns.is_empty() {
            self.columns = match chunk.columns {
                Some(columns) if !columns.is_empty() => columns,
                _ => chunk.rows[0].columns().map(str::to_owned).collect(),
            };
        }

        let added = chunk.rows.len();
        self.rows.extend(chunk.rows);
        added
    }

    /// Drop all rows and columns and start a new session.
    pub fn reset(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.session = self.session.wrapping_add(1);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Identifies the current ingestion session; bumped by [`RowStore::reset`].
    pub fn session(&self) -> u64 {
        self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(col: &str, brand: &str) -> Row {
        Row::from_pairs([("col", col), ("brand", brand)])
    }

    #[test]
    fn test_row_distinguishes_empty_from_absent() {
        let row = Row::from_pairs([("name", ""), ("brand", "Acme")]);
        assert_eq!(row.get("name"), Some(""));
        assert_eq!(row.get("price"), None);
        assert_eq!(row.columns().collect::<Vec<_>>(), ["name", "brand"]);
    }

    #[test]
    fn test_row_insert_keeps_position() {
        let mut row = Row::from_pairs([("a", "1"), ("b", "2")]);
        row.insert(Arc::from("a"), "3");
        assert_eq!(row.iter().collect::<Vec<_>>(), [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_row_serializes_in_column_order() {
        let row = Row::from_pairs([("z", "1"), ("a", "2")]);
        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn test_first_chunk_fixes_columns() {
        let mut store = RowStore::new();
        assert!(store.columns().is_empty());

        store.ingest_chunk(Chunk::with_columns(
            vec!["col".into(), "brand".into()],
            vec![row("A", "X")],
        ));
        store.ingest_chunk(Chunk::with_columns(
            vec!["other".into()],
            vec![Row::from_pairs([("col", "B"), ("extra", "1")])],
        ));

        assert_eq!(store.columns(), ["col", "brand"]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(0).and_then(|r| r.get("extra")), None);
        assert_eq!(store.get(1).and_then(|r| r.get("extra")), Some("1"));
    }

    #[test]
    fn test_columns_fall_back_to_first_row_keys() {
        let mut store = RowStore::new();
        store.ingest_chunk(Chunk::new(vec![row("A", "X")]));
        assert_eq!(store.columns(), ["col", "brand"]);
    }

    #[test]
    fn test_empty_chunk_is_noop() {
        let mut store = RowStore::new();
        let added = store.ingest_chunk(Chunk::with_columns(vec!["col".into()], Vec::new()));
        assert_eq!(added, 0);
        assert!(store.columns().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_reset_clears_and_bumps_session() {
        let mut store = RowStore::new();
        store.ingest_chunk(Chunk::new(vec![row("A", "X"), row("B", "Y")]));
        let session = store.session();

        store.reset();

        assert!(store.is_empty());
        assert!(store.columns().is_empty());
        assert_ne!(store.session(), session);
    }
}
