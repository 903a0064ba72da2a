use std::{fs::File, io, path::Path, sync::Arc};

use csv::{ReaderBuilder, StringRecord};

use crate::{
    error::Result,
    store::{Chunk, Row},
};

pub const DEFAULT_CHUNK_SIZE: usize = 1_000;
const UTF8_BOM: char = '\u{feff}';

/// Decodes a CSV source into [`Chunk`]s of at most `chunk_size` rows.
///
/// The first line is the header. Records may be ragged: missing trailing
/// fields are absent from the row, and fields past the header are kept under
/// `__parsed_extra_<n>` names. A decode error ends the stream; the rows of the
/// chunk being assembled at that moment are not emitted.
pub struct CsvChunks<R> {
    reader: csv::Reader<R>,
    header: Option<Vec<Arc<str>>>,
    chunk_size: usize,
    record: StringRecord,
    done: bool,
}

impl CsvChunks<File> {
    pub fn from_path<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<Self> {
        Ok(Self::new(File::open(path)?, chunk_size))
    }
}

impl<R: io::Read> CsvChunks<R> {
    pub fn new(rdr: R, chunk_size: usize) -> Self {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(rdr);
        Self {
            reader,
            header: None,
            chunk_size: chunk_size.max(1),
            record: StringRecord::new(),
            done: false,
        }
    }

    fn read_header(&mut self) -> csv::Result<Vec<Arc<str>>> {
        let headers = self.reader.headers()?;
        Ok(headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let h = if i == 0 { h.trim_start_matches(UTF8_BOM) } else { h };
                Arc::from(h)
            })
            .collect())
    }

    fn next_chunk(&mut self) -> csv::Result<Option<Chunk>> {
        let columns = match self.header {
            Some(_) => None,
            None => {
                let header = self.read_header()?;
                let names = header.iter().map(|h| h.to_string()).collect();
                self.header = Some(header);
                Some(names)
            }
        };
        let header = self.header.as_deref().unwrap_or_default();

        let mut rows = Vec::with_capacity(self.chunk_size);
        while rows.len() < self.chunk_size {
            if !self.reader.read_record(&mut self.record)? {
                self.done = true;
                break;
            }
            rows.push(record_to_row(header, &self.record));
        }

        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(Chunk { columns, rows }))
    }
}

fn record_to_row(header: &[Arc<str>], record: &StringRecord) -> Row {
    let mut row = Row::with_capacity(record.len());
    for (i, field) in record.iter().enumerate() {
        let column = match header.get(i) {
            Some(name) => Arc::clone(name),
            None => Arc::from(format!("__parsed_extra_{}", i - header.len())),
        };
        row.insert(column, field);
    }
    row
}

impl<R: io::Read> Iterator for CsvChunks<R> {
    type Item = csv::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_chunk() {
            Ok(Some(chunk)) => Some(Ok(chunk)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
