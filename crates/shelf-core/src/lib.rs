#![deny(unused_must_use)]
// Don't allow dbg! prints in release.
#![cfg_attr(not(debug_assertions), deny(clippy::dbg_macro))]

pub use catalog::{Catalog, CatalogColumns, CatalogQuery, MemoryCatalog};
pub use config::{DashboardConfig, TelegramConfig};
pub use dashboard::{Dashboard, LoadState};
pub use error::{Error, Result};
pub use filter::{Filter, FilterSet};
pub use query::{SortDirection, SortSpec, View};
pub use store::{Chunk, Row, RowStore};

pub mod catalog;
pub mod config;
pub mod dashboard;
pub mod debounce;
pub mod error;
pub mod facet;
pub mod filter;
pub mod ingest;
pub mod page;
pub mod query;
pub mod selection;
pub mod sink;
pub mod store;
pub mod virtual_window;
