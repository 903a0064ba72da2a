use std::io::{self, Write};

use shelf_core::Dashboard;

use super::open_dashboard;
use crate::cli::ViewArgs;

pub async fn run(args: ViewArgs, json: bool) -> anyhow::Result<()> {
    let dashboard = open_dashboard(&args).await?;
    let mut out = io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &dashboard.page_rows())?;
        writeln!(out)?;
        eprintln!("{}", status_line(&dashboard));
        return Ok(());
    }

    writeln!(out, "{}", dashboard.columns().join("\t"))?;
    for row in dashboard.page_rows() {
        let cells: Vec<String> = dashboard
            .columns()
            .iter()
            .map(|c| clean_cell(row.get(c).unwrap_or_default()))
            .collect();
        writeln!(out, "{}", cells.join("\t"))?;
    }
    writeln!(out, "{}", status_line(&dashboard))?;
    Ok(())
}

fn status_line(dashboard: &Dashboard) -> String {
    format!(
        "{} (page {} of {})",
        dashboard.summary(),
        dashboard.page(),
        dashboard.page_count()
    )
}

// one table line per row
fn clean_cell(cell: &str) -> String {
    cell.replace(['\t', '\r', '\n'], " ")
}
