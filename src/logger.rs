//! Logging: console notes on stderr, plus a daily rotated debug log file.

use anyhow::Result;
use logroller::{LogRollerBuilder, Rotation, RotationAge, TimeZone};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use time::macros::format_description;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "coach-learn";

/// Initialize the logging system.
///
/// The console layer honours `RUST_LOG`, falling back to `config.log_level`.
/// With `debug` set, everything down to DEBUG is also written to
/// `config.log_path`.
pub fn init(config: &Config, debug: bool) -> Result<()> {
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| anyhow::anyhow!("Invalid log level {:?}: {}", config.log_level, e))?;

    let console = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .without_time()
        .with_filter(console_filter);

    let file = if debug {
        let writer = file_writer(&config.log_path)?;

        // Use local timezone for timestamps
        let time_format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
        let local_offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
        let timer = OffsetTime::new(local_offset, time_format);

        Some(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(true)
                .with_line_number(true)
                .with_timer(timer)
                .with_filter(LevelFilter::DEBUG),
        )
    } else {
        None
    };

    let subscriber = tracing_subscriber::registry().with(console).with(file);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    Ok(())
}

fn file_writer(log_path: &Path) -> Result<tracing_appender::non_blocking::NonBlocking> {
    if !log_path.exists() {
        fs::create_dir_all(log_path)?;
    }

    cleanup_old_logs(log_path)?;

    // File naming: coach-learn.YYYY-MM-DD
    let appender = LogRollerBuilder::new(log_path, Path::new(LOG_FILE_PREFIX))
        .rotation(Rotation::AgeBased(RotationAge::Daily))
        .time_zone(TimeZone::Local)
        .max_keep_files(3)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create log roller: {}", e))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    // Keep the guard alive for the duration of the program
    std::mem::forget(guard);

    Ok(non_blocking)
}

/// Clean up log files older than 3 days.
pub fn cleanup_old_logs(log_path: &Path) -> Result<()> {
    use std::time::{Duration, SystemTime};

    let three_days = Duration::from_secs(3 * 24 * 60 * 60);
    let cutoff = SystemTime::now() - three_days;

    if !log_path.exists() {
        return Ok(());
    }

    for entry in fs::read_dir(log_path)? {
        let entry = entry?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        let filename = match path.file_name().and_then(|n| n.to_str()) {
            Some(n) => n,
            None => continue,
        };

        if !filename.starts_with(LOG_FILE_PREFIX) {
            continue;
        }

        if let Ok(metadata) = entry.metadata()
            && let Ok(modified) = metadata.modified()
            && modified < cutoff
        {
            let _ = fs::remove_file(&path);
        }
    }

    Ok(())
}
