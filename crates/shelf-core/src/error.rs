//! Error types for `shelf-core`.
//!
//! Only genuine I/O, decoding and backend failures are errors here. Stale facet
//! scans and out-of-range selection indices are handled silently by the engine.

use thiserror::Error;

/// Result type alias for `shelf-core` operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV source failed mid-stream. Rows committed before the failure
    /// remain in the store.
    #[error("CSV ingestion failed after {rows} rows: {source}")]
    Ingest {
        rows: usize,
        #[source]
        source: csv::Error,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The Telegram Bot API answered, but not with `ok: true`.
    #[error("Telegram API error: {0}")]
    Telegram(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("catalog backend error: {0}")]
    Backend(String),
}
