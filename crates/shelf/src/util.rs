use std::{env, fs};

use anyhow::{anyhow, bail};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, fmt, fmt::writer::BoxMakeWriter, layer::SubscriberExt};

const CARGO_BIN_NAME: &str = env!("CARGO_BIN_NAME");

pub fn get_envvar_flag(key: &str) -> bool {
    match env::var(key) {
        Ok(val) => matches!(
            val.to_lowercase().as_str(),
            "true" | "t" | "1" | "yes" | "y"
        ),
        Err(_) => false,
    }
}

/// Install the global tracing subscriber.
///
/// `SHELF_LOG_LEVEL` takes an `EnvFilter` directive and defaults to `off`.
/// Output goes to stderr, or to a daily rolling file when `SHELF_LOG_DIR` is
/// set. File output goes through a background writer unless
/// `SHELF_LOG_UNBUFFERED` is set; keep the returned guard alive until exit.
pub fn init_logger() -> anyhow::Result<Option<WorkerGuard>> {
    let level = env::var("SHELF_LOG_LEVEL").unwrap_or_else(|_| "off".to_string());
    // route `log` records even when nothing is printed
    let _ = LogTracer::init();
    if level.eq_ignore_ascii_case("off") {
        return Ok(None);
    }

    let env_filter = EnvFilter::try_new(&level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (make_writer, guard, ansi) = match env::var("SHELF_LOG_DIR") {
        Ok(log_dir) => {
            fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create SHELF_LOG_DIR '{log_dir}': {e}"))?;
            let appender =
                tracing_appender::rolling::daily(&log_dir, format!("{CARGO_BIN_NAME}.log"));
            if get_envvar_flag("SHELF_LOG_UNBUFFERED") {
                (BoxMakeWriter::new(appender), None, false)
            } else {
                let (nb, guard) = tracing_appender::non_blocking(appender);
                (BoxMakeWriter::new(nb), Some(guard), false)
            }
        }
        Err(_) => (BoxMakeWriter::new(std::io::stderr), None, true),
    };

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_ansi(ansi)
            .with_writer(make_writer)
            .with_level(true)
            .with_target(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow!("Failed to set global tracing subscriber: {e}"))?;

    tracing::info!(
        "START: {}",
        env::args().skip(1).collect::<Vec<_>>().join(" ")
    );
    Ok(guard)
}

/// Load a `.env` file: the one named by `SHELF_DOTENV_PATH` (`<NONE>` turns
/// this off), else one in the current directory, else `shelf.env` next to the
/// executable. A missing file is not an error.
pub fn load_dotenv() -> anyhow::Result<()> {
    if let Ok(dotenv_path) = env::var("SHELF_DOTENV_PATH") {
        if dotenv_path == "<NONE>" {
            return Ok(());
        }
        let canonical = fs::canonicalize(&dotenv_path)?;
        if let Err(e) = dotenvy::from_filename_override(&canonical) {
            bail!(
                "Cannot process .env file set in SHELF_DOTENV_PATH - {}: {e}",
                canonical.display()
            );
        }
        tracing::info!("Using .env file: {}", canonical.display());
        return Ok(());
    }

    if dotenvy::dotenv_override().is_ok() {
        tracing::info!(
            "Using .env file in current directory: {}",
            env::current_dir()?.display()
        );
        return Ok(());
    }

    let exe = env::current_exe()?;
    let Some(stem) = exe.file_stem().and_then(|s| s.to_str()) else {
        return Ok(());
    };
    let profile = exe.with_file_name(format!("{stem}.env"));
    if profile.exists() {
        tracing::info!("Using binary .env file: {}", profile.display());
        if let Err(e) = dotenvy::from_filename_override(&profile) {
            bail!("Cannot process binary .env file - {}: {e}", profile.display());
        }
    }
    Ok(())
}

/// `COL=V1,V2` into the column and its non-empty values.
pub fn parse_filter(arg: &str) -> anyhow::Result<(String, Vec<String>)> {
    let (column, values) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("filter '{arg}' is not of the form COL=V1,V2"))?;
    if column.is_empty() {
        bail!("filter '{arg}' has no column");
    }
    let values = values
        .split(',')
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((column.to_string(), values))
}

/// `KEY=VALUE` into its parts. The value may be empty.
pub fn parse_param(arg: &str) -> anyhow::Result<(String, String)> {
    arg.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| anyhow!("parameter '{arg}' is not of the form KEY=VALUE"))
}
