use std::io::{self, Write};

use anyhow::bail;

use super::open_dashboard;
use crate::cli::ViewArgs;

pub async fn run(args: ViewArgs, column: String) -> anyhow::Result<()> {
    let mut dashboard = open_dashboard(&args).await?;
    if !dashboard.columns().contains(&column) {
        bail!(
            "unknown column '{column}'; available: {}",
            dashboard.columns().join(", ")
        );
    }

    dashboard.select_facet_column(column);
    dashboard.settle_facets().await;

    let mut out = io::stdout().lock();
    for option in dashboard.facet_options() {
        writeln!(out, "{option}")?;
    }
    Ok(())
}
