use std::io::{self, Write};

use anyhow::{Context, bail};
use shelf_core::{
    TelegramConfig,
    sink::{ColumnMapping, TelegramSender, broadcast},
};

use super::open_dashboard;
use crate::cli::ViewArgs;

pub async fn run(
    args: ViewArgs,
    rows: Vec<usize>,
    select_page: bool,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut dashboard = open_dashboard(&args).await?;
    if select_page {
        dashboard.toggle_page();
    }
    for index in rows {
        if index >= dashboard.view_len() {
            tracing::warn!(index, view = dashboard.view_len(), "row index outside the view");
        }
        dashboard.select_global(index);
    }

    let records = dashboard.selected_records(&ColumnMapping::default());
    if records.is_empty() {
        bail!("no rows selected; pass --rows or --select-page");
    }

    if dry_run {
        let mut out = io::stdout().lock();
        for record in &records {
            match record.photo() {
                Some(photo) => writeln!(out, "photo: {photo}\n{}\n", record.caption())?,
                None => writeln!(out, "skip: {} has no image\n", record.name)?,
            }
        }
        return Ok(());
    }

    let config = TelegramConfig::from_env().context("Telegram is not configured")?;
    let sender = TelegramSender::new(&config)?;
    let report = broadcast(&sender, &records, config.send_delay).await;

    serde_json::to_writer_pretty(io::stdout().lock(), &report)?;
    println!();
    if !report.is_success() {
        bail!(
            "{} of {} posts failed",
            report.failed.len(),
            report.attempted()
        );
    }
    Ok(())
}
