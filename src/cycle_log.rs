//! Per-cycle decision log
//!
//! One line per cycle is appended to a plain text file:
//! `<date> <time> <power> <threshold> <0|1>`, where `<power>` is the total
//! followed by `(m1+m2+...)` when more than one meter is configured.
//! Failing to write is reported and otherwise ignored.

use crate::logging::get_logger;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Inputs and outcome of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleDecision {
    pub timestamp: NaiveDateTime,
    pub per_meter: Vec<u32>,
    pub power: u32,
    pub threshold: u32,
    pub weather_admitted: bool,
    pub engaged: bool,
}

impl CycleDecision {
    /// Render the log line (without trailing newline)
    pub fn to_line(&self) -> String {
        let power = if self.per_meter.len() > 1 {
            let parts: Vec<String> = self.per_meter.iter().map(u32::to_string).collect();
            format!("{}({})", self.power, parts.join("+"))
        } else {
            self.power.to_string()
        };
        format!(
            "{} {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            power,
            self.threshold,
            u8::from(self.engaged)
        )
    }
}

/// Appends decisions to the cycle log file
pub struct CycleLogger {
    path: Option<PathBuf>,
    logger: crate::logging::StructuredLogger,
}

impl CycleLogger {
    /// Logger writing to `path`; an empty path disables the file
    pub fn new(path: &str) -> Self {
        let path = path.trim();
        Self {
            path: (!path.is_empty()).then(|| PathBuf::from(path)),
            logger: get_logger("cycle_log"),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record one decision; returns whether the file append succeeded
    pub async fn record(&self, decision: &CycleDecision) -> bool {
        let line = decision.to_line();
        self.logger.info(&format!(
            "power={} threshold={} weather_ok={} engaged={}",
            decision.power, decision.threshold, decision.weather_admitted, decision.engaged
        ));

        let Some(path) = &self.path else {
            return false;
        };

        match append_line(path, &line).await {
            Ok(()) => true,
            Err(e) => {
                self.logger.warn(&format!(
                    "Failed to append to cycle log {}: {}",
                    path.display(),
                    e
                ));
                false
            }
        }
    }
}

async fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(format!("{}\n", line).as_bytes()).await?;
    file.flush().await
}
