//! Structured logging and tracing for the switcher
//!
//! Diagnostics go through `tracing` to the console and to a daily-rotated
//! file. The per-cycle decision record is separate (see `cycle_log`).

use crate::config::LoggingConfig;
use crate::error::{Result, SwitcherError};
use std::path::Path;
use tracing::{Level, info};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod level;
mod state;
mod structured;

pub use level::{min_level, parse_log_level};
pub use structured::{LogContext, StructuredLogger, get_logger, get_logger_with_context};

use state::{INIT_ERROR, INIT_ONCE, LOG_GUARD};

/// Environment variable forcing console-only output
pub const DISABLE_FILE_LOG_ENV: &str = "PV_SWITCHER_DISABLE_FILE_LOG";

/// Initialize logging system based on configuration
///
/// `debug` lowers every output to at least DEBUG so the per-cycle threshold,
/// weather and relay diagnostics become visible.
pub fn init_logging(config: &LoggingConfig, debug: bool) -> Result<()> {
    INIT_ONCE.call_once(|| {
        let init_result = (|| -> Result<()> {
            let mut base_level = parse_log_level(&config.level)?;
            if debug {
                base_level = min_level(base_level, Level::DEBUG);
            }

            let console_level = layer_level(config.console_level.as_deref(), base_level, debug);
            let file_level = layer_level(config.file_level.as_deref(), base_level, debug);

            let filter = build_env_filter(min_level(console_level, file_level));

            if should_use_console_only() {
                init_console_only_logging(filter, config.json_format, console_level);
                return Ok(());
            }

            init_file_logging(config, filter, console_level, file_level)
        })();

        if let Err(e) = init_result {
            let _ = INIT_ERROR.set(e.to_string());
        }
    });

    if let Some(err) = INIT_ERROR.get() {
        return Err(SwitcherError::config(err.clone()));
    }
    Ok(())
}

fn layer_level(override_level: Option<&str>, base: Level, debug: bool) -> Level {
    let level = override_level
        .and_then(|s| parse_log_level(s).ok())
        .unwrap_or(base);
    if debug { min_level(level, Level::DEBUG) } else { level }
}

fn build_env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("pv_switcher={},tokio_modbus=warn,reqwest=warn", level).into())
}

fn should_use_console_only() -> bool {
    cfg!(test) || std::env::var_os(DISABLE_FILE_LOG_ENV).is_some()
}

fn init_console_only_logging(filter: EnvFilter, json_format: bool, console_level: Level) {
    let console_layer = {
        let layer = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if json_format {
            layer
                .json()
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        } else {
            layer
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        }
    };

    // A subscriber may already be installed (tests, embedding binaries)
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .try_init();

    info!(
        "Logging initialized - console_level: {:?}, console-only",
        console_level
    );
}

fn init_file_logging(
    config: &LoggingConfig,
    filter: EnvFilter,
    console_level: Level,
    file_level: Level,
) -> Result<()> {
    let (directory, prefix) = split_log_path(&config.file);

    let file_appender = rolling::Builder::new()
        .rotation(rolling::Rotation::DAILY)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(config.backup_count.max(1) as usize)
        .build(directory)
        .map_err(|e| SwitcherError::io(format!("Failed to create log file appender: {}", e)))?;

    let (non_blocking_appender, guard) = non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    let file_layer = {
        let base = fmt::layer()
            .with_writer(non_blocking_appender)
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(file_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(file_level))
                .boxed()
        }
    };

    let console_layer = config.console_output.then(|| {
        let base = fmt::layer()
            .with_writer(std::io::stdout)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false);
        if config.json_format {
            base.json()
                .with_filter(LevelFilter::from_level(console_level))
                .boxed()
        } else {
            base.with_filter(LevelFilter::from_level(console_level))
                .boxed()
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| SwitcherError::config(format!("Failed to install subscriber: {}", e)))?;

    info!(
        "Logging initialized - console_level: {:?}, file_level: {:?}, file: {}",
        console_level, file_level, config.file
    );
    Ok(())
}

/// Split the configured log path into (directory, file prefix)
///
/// A path with an extension names a file whose stem becomes the prefix of
/// the rotated files; anything else is treated as a directory.
fn split_log_path(file: &str) -> (&Path, String) {
    let p = Path::new(file);
    if p.extension().is_some() {
        let dir = p
            .parent()
            .filter(|d| !d.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let prefix = p
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pv-switcher".to_string());
        (dir, prefix)
    } else {
        (p, "pv-switcher".to_string())
    }
}
