//! File logging. The TUI owns the terminal, so nothing is written to stderr
//! once the screen is up.

use anyhow::{Context, Result};
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use once_cell::sync::OnceCell;
use std::path::Path;

const LOG_FILE_BASENAME: &str = "taskpad";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;

static LOGGER: OnceCell<LoggerHandle> = OnceCell::new();

/// Starts the rotating file logger. Calling it again is a no-op.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<()> {
    LOGGER.get_or_try_init(|| -> Result<LoggerHandle> {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory `{}`", log_dir.display()))?;

        let handle = Logger::try_with_str(level)
            .with_context(|| format!("invalid log level `{level}`"))?
            .log_to_file(
                FileSpec::default()
                    .directory(log_dir)
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .context("failed to start logger")?;

        log::info!(
            "event=app_start status=ok version={} level={} log_dir={}",
            env!("CARGO_PKG_VERSION"),
            level,
            log_dir.display()
        );
        Ok(handle)
    })?;
    Ok(())
}

/// Flushes buffered log lines before the process exits.
pub fn flush() {
    if let Some(handle) = LOGGER.get() {
        handle.flush();
    }
}
