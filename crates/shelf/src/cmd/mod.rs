use anyhow::Context;
use shelf_core::{Dashboard, DashboardConfig, Error, SortDirection, SortSpec};

use crate::{cli::ViewArgs, util::parse_filter};

pub mod catalog;
pub mod facets;
pub mod send;
pub mod view;

/// Load `args.input` and apply every view flag.
///
/// A CSV that breaks part-way is not fatal: the rows read before the error
/// are used and a warning is printed.
pub async fn open_dashboard(args: &ViewArgs) -> anyhow::Result<Dashboard> {
    let mut config = DashboardConfig::default();
    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(chunk_size) = args.chunk_size {
        config.chunk_size = chunk_size;
    }

    let mut dashboard = Dashboard::new(config);
    match dashboard.load_path(&args.input).await {
        Ok(_) => {}
        Err(e @ Error::Ingest { .. }) => {
            eprintln!("warning: {e}; continuing with the rows read so far");
        }
        Err(e) => {
            return Err(e).with_context(|| format!("loading {}", args.input.display()));
        }
    }

    for arg in &args.filters {
        let (column, values) = parse_filter(arg)?;
        if !dashboard.add_filter(&column, values) {
            tracing::warn!(filter = %arg, "ignoring filter without values");
        }
    }
    if let Some(search) = &args.search {
        dashboard.set_search(search.as_str());
    }
    if let Some(column) = &args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        dashboard.set_sort(SortSpec::by(column.as_str(), direction));
    }
    dashboard.goto_page(args.page);
    Ok(dashboard)
}
