//! Relay output
//!
//! The controller only sees the `Relay` capability. On a Raspberry Pi the
//! relay hangs off a GPIO line driven through sysfs; without hardware (or
//! when opening the line fails) a dry-run relay takes its place so decisions
//! are still made and logged.

use crate::config::RelayConfig;
use crate::error::{Result, SwitcherError};
use crate::logging::{LogContext, get_logger, get_logger_with_context};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Switchable load
#[async_trait::async_trait]
pub trait Relay: Send {
    /// Human-readable description for the startup summary
    fn describe(&self) -> String;

    /// Switch the load on; idempotent
    async fn engage(&mut self);

    /// Switch the load off; idempotent
    async fn disengage(&mut self);
}

/// Relay on a sysfs GPIO line
pub struct GpioRelay {
    pin: u32,
    value_path: PathBuf,
    logger: crate::logging::StructuredLogger,
}

impl GpioRelay {
    /// Export the line if needed and configure it as an output driven low
    pub async fn open(config: &RelayConfig) -> Result<Self> {
        let root = Path::new(&config.sysfs_root);
        let line_dir = root.join(format!("gpio{}", config.gpio_pin));

        if !tokio::fs::try_exists(&line_dir).await.unwrap_or(false) {
            tokio::fs::write(root.join("export"), config.gpio_pin.to_string())
                .await
                .map_err(|e| {
                    SwitcherError::relay(format!(
                        "Failed to export GPIO {}: {}",
                        config.gpio_pin, e
                    ))
                })?;
            wait_for_line(&line_dir).await?;
        }

        // "low" sets the direction to output with the value at 0
        tokio::fs::write(line_dir.join("direction"), "low")
            .await
            .map_err(|e| {
                SwitcherError::relay(format!(
                    "Failed to configure GPIO {} as output: {}",
                    config.gpio_pin, e
                ))
            })?;

        let logger = get_logger_with_context(
            LogContext::new("relay").with_field("gpio", config.gpio_pin.to_string()),
        );
        Ok(Self {
            pin: config.gpio_pin,
            value_path: line_dir.join("value"),
            logger,
        })
    }

    async fn set(&self, on: bool) {
        let value = if on { "1" } else { "0" };
        if let Err(e) = tokio::fs::write(&self.value_path, value).await {
            self.logger
                .error(&format!("Failed to write {} to GPIO {}: {}", value, self.pin, e));
        }
    }
}

/// sysfs creates the line directory asynchronously after export
async fn wait_for_line(line_dir: &Path) -> Result<()> {
    for _ in 0..20 {
        if tokio::fs::try_exists(line_dir.join("value"))
            .await
            .unwrap_or(false)
        {
            return Ok(());
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Err(SwitcherError::relay(format!(
        "GPIO line {} did not appear after export",
        line_dir.display()
    )))
}

#[async_trait::async_trait]
impl Relay for GpioRelay {
    fn describe(&self) -> String {
        format!("GPIO {} ({})", self.pin, self.value_path.display())
    }

    async fn engage(&mut self) {
        self.logger.debug(" ==> engaging");
        self.set(true).await;
    }

    async fn disengage(&mut self) {
        self.logger.debug(" ==> disengaging");
        self.set(false).await;
    }
}

/// Relay without hardware; only logs
pub struct DryRunRelay {
    logger: crate::logging::StructuredLogger,
}

impl DryRunRelay {
    pub fn new() -> Self {
        Self {
            logger: get_logger("relay"),
        }
    }
}

impl Default for DryRunRelay {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Relay for DryRunRelay {
    fn describe(&self) -> String {
        "dry run (no hardware)".to_string()
    }

    async fn engage(&mut self) {
        self.logger.debug(" ==> engaging (dry run)");
    }

    async fn disengage(&mut self) {
        self.logger.debug(" ==> disengaging (dry run)");
    }
}

/// Open the configured relay, falling back to dry run when unavailable
pub async fn open_relay(config: &RelayConfig) -> Box<dyn Relay> {
    if config.dry_run {
        return Box::new(DryRunRelay::new());
    }
    match GpioRelay::open(config).await {
        Ok(relay) => Box::new(relay),
        Err(e) => {
            get_logger("relay").warn(&format!(
                "Relay unavailable, switching to dry run: {}",
                e
            ));
            Box::new(DryRunRelay::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_sysfs(pin: u32) -> (tempfile::TempDir, RelayConfig) {
        let dir = tempfile::tempdir().unwrap();
        let line = dir.path().join(format!("gpio{}", pin));
        std::fs::create_dir(&line).unwrap();
        std::fs::write(line.join("direction"), "in").unwrap();
        std::fs::write(line.join("value"), "0").unwrap();
        let config = RelayConfig {
            gpio_pin: pin,
            sysfs_root: dir.path().to_string_lossy().to_string(),
            dry_run: false,
        };
        (dir, config)
    }

    #[tokio::test]
    async fn gpio_relay_drives_value_file() {
        let (dir, config) = fake_sysfs(27);
        let line = dir.path().join("gpio27");

        let mut relay = GpioRelay::open(&config).await.unwrap();
        assert_eq!(std::fs::read_to_string(line.join("direction")).unwrap(), "low");

        relay.engage().await;
        assert_eq!(std::fs::read_to_string(line.join("value")).unwrap(), "1");
        relay.engage().await;
        assert_eq!(std::fs::read_to_string(line.join("value")).unwrap(), "1");

        relay.disengage().await;
        assert_eq!(std::fs::read_to_string(line.join("value")).unwrap(), "0");
    }

    #[tokio::test]
    async fn missing_line_falls_back_to_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = RelayConfig {
            gpio_pin: 5,
            sysfs_root: dir.path().to_string_lossy().to_string(),
            dry_run: false,
        };
        assert!(GpioRelay::open(&config).await.is_err());

        let relay = open_relay(&config).await;
        assert!(relay.describe().starts_with("dry run"));
    }

    #[tokio::test]
    async fn dry_run_flag_skips_hardware() {
        let (_dir, mut config) = fake_sysfs(17);
        config.dry_run = true;
        let mut relay = open_relay(&config).await;
        assert!(relay.describe().starts_with("dry run"));
        relay.engage().await;
        relay.disengage().await;
    }
}
