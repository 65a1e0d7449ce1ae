//! Configuration management for the switcher
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files. The loaded `Config` is immutable and handed
//! to each component at construction.

use crate::clock::Zone;
use crate::error::{Result, SwitcherError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

mod defaults;

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "PV_SWITCHER_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Normalized switching threshold in Watts, scaled per day of year
    pub threshold_watts: u32,

    /// Poll interval between idle cycles, in minutes
    pub interval_minutes: f64,

    /// Dwell time held after each engage, in minutes
    pub minimum_on_time_minutes: f64,

    /// Daily budget of ON time, in minutes
    pub maximum_on_time_minutes: f64,

    /// Power meters whose readings are summed each cycle
    pub meters: Vec<MeterConfig>,

    /// Forecast admission gate
    pub weather: WeatherConfig,

    /// Relay output
    pub relay: RelayConfig,

    /// Day-of-year scaling factors
    pub scaling: ScalingConfig,

    /// Hysteresis policy
    pub controls: ControlsConfig,

    /// Diagnostic logging
    pub logging: LoggingConfig,

    /// Per-cycle decision log
    pub cycle_log: CycleLogConfig,

    /// `local` or an IANA zone name; decides the calendar day
    pub timezone: String,

    /// Verbose per-cycle diagnostics
    pub debug: bool,
}

/// Register encoding of the power value on a meter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisterFormat {
    U16,
    S16,
    U32,
    S32,
}

impl RegisterFormat {
    /// Number of 16-bit registers holding one value
    pub fn word_count(self) -> u16 {
        match self {
            RegisterFormat::U16 | RegisterFormat::S16 => 1,
            RegisterFormat::U32 | RegisterFormat::S32 => 2,
        }
    }
}

/// Modbus TCP power meter (inverter) endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeterConfig {
    /// Label used in logs
    pub name: String,

    /// Host name or IP address
    pub host: String,

    /// TCP port (typically 502)
    pub port: u16,

    /// Modbus unit (slave) id
    pub unit_id: u8,

    /// First holding register of the power value
    pub register: u16,

    /// Encoding of the power value
    pub format: RegisterFormat,
}

/// OpenWeatherMap settings; leaving `api_key` empty disables the gate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// API key (appid)
    pub api_key: Option<String>,

    /// Latitude in decimal degrees
    pub lat: f64,

    /// Longitude in decimal degrees
    pub lon: f64,

    /// Base URL of the One Call endpoint
    pub base_url: String,

    /// HTTP timeout in seconds
    pub timeout_seconds: u64,
}

impl WeatherConfig {
    /// Whether credentials are configured
    pub fn enabled(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| !key.trim().is_empty())
    }
}

/// Relay output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// GPIO line driving the relay; pick one that boots pulled down
    pub gpio_pin: u32,

    /// Root of the sysfs GPIO interface
    pub sysfs_root: String,

    /// Never touch hardware, only log switching decisions
    pub dry_run: bool,
}

/// Scaling factor source
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalingConfig {
    /// One factor per line; line 1 is day-of-year 1
    pub file: String,
}

/// When the daily ON counter is cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CounterResetPolicy {
    /// Clear on the first idle cycle of a new calendar day
    Daily,
    /// Clear on every idle cycle
    OnDisengage,
}

/// Hysteresis policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    pub counter_reset: CounterResetPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional override for console output
    pub console_level: Option<String>,

    /// Optional override for the file output
    pub file_level: Option<String>,

    /// Path of the diagnostic log; its directory receives daily files
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Per-cycle decision log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleLogConfig {
    /// Append-only text file; empty disables it
    pub file: String,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `$PV_SWITCHER_CONFIG` or a default location
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR)
            && !path.trim().is_empty()
        {
            return Self::from_file(path.trim());
        }

        let default_paths = [
            "pv_switcher.yaml",
            "/data/pv_switcher.yaml",
            "/etc/pv-switcher/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Number of `minimum_on_time` periods allowed per day
    pub fn periods(&self) -> u32 {
        if self.minimum_on_time_minutes <= 0.0 {
            return 0;
        }
        (self.maximum_on_time_minutes / self.minimum_on_time_minutes).floor() as u32
    }

    /// Idle wait between cycles
    pub fn interval(&self) -> Duration {
        minutes(self.interval_minutes)
    }

    /// Dwell held after each engage
    pub fn minimum_on_time(&self) -> Duration {
        minutes(self.minimum_on_time_minutes)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.threshold_watts == 0 {
            return Err(SwitcherError::validation(
                "threshold_watts",
                "Must be greater than 0",
            ));
        }

        if !self.interval_minutes.is_finite() || self.interval_minutes < 0.0 {
            return Err(SwitcherError::validation(
                "interval_minutes",
                "Must be a non-negative number",
            ));
        }
        check_minutes("interval_minutes", self.interval_minutes)?;

        if !self.minimum_on_time_minutes.is_finite() || self.minimum_on_time_minutes <= 0.0 {
            return Err(SwitcherError::validation(
                "minimum_on_time_minutes",
                "Must be positive",
            ));
        }
        check_minutes("minimum_on_time_minutes", self.minimum_on_time_minutes)?;

        if !self.maximum_on_time_minutes.is_finite()
            || self.maximum_on_time_minutes < self.minimum_on_time_minutes
        {
            return Err(SwitcherError::validation(
                "maximum_on_time_minutes",
                "Must be at least minimum_on_time_minutes",
            ));
        }

        if self.meters.is_empty() {
            return Err(SwitcherError::validation(
                "meters",
                "At least one meter is required",
            ));
        }

        for meter in &self.meters {
            if meter.host.trim().is_empty() {
                return Err(SwitcherError::validation(
                    "meters.host",
                    "Host cannot be empty",
                ));
            }
            if meter.port == 0 {
                return Err(SwitcherError::validation(
                    "meters.port",
                    "Port must be greater than 0",
                ));
            }
        }

        if self.weather.enabled()
            && (!self.weather.lat.is_finite() || !self.weather.lon.is_finite())
        {
            return Err(SwitcherError::validation(
                "weather",
                "Coordinates must be finite numbers",
            ));
        }

        Zone::parse(&self.timezone)?;

        Ok(())
    }
}

fn minutes(value: f64) -> Duration {
    if value.is_finite() && value > 0.0 {
        Duration::try_from_secs_f64(value * 60.0).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Reject minute values too large for a `Duration`
fn check_minutes(field: &str, value: f64) -> Result<()> {
    Duration::try_from_secs_f64(value * 60.0)
        .map(|_| ())
        .map_err(|e| SwitcherError::validation(field.to_string(), format!("Out of range: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.threshold_watts, 1200);
        assert_eq!(config.meters.len(), 1);
        assert_eq!(config.meters[0].port, 502);
        assert_eq!(config.meters[0].register, 30775);
        assert!(!config.weather.enabled());
        assert_eq!(config.controls.counter_reset, CounterResetPolicy::Daily);
    }

    #[test]
    fn test_periods_truncates() {
        let mut config = Config::default();
        assert_eq!(config.periods(), 5);

        config.minimum_on_time_minutes = 2.0;
        config.maximum_on_time_minutes = 5.0;
        assert_eq!(config.periods(), 2);
    }

    #[test]
    fn test_durations() {
        let config = Config {
            interval_minutes: 0.5,
            minimum_on_time_minutes: 1.0,
            ..Config::default()
        };
        assert_eq!(config.interval(), Duration::from_secs(30));
        assert_eq!(config.minimum_on_time(), Duration::from_secs(60));
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.maximum_on_time_minutes = 0.5;
        assert!(config.validate().is_err());

        config = Config::default();
        config.meters.clear();
        assert!(config.validate().is_err());

        config = Config::default();
        config.timezone = "Mars/Olympus".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_weather_enabled_requires_key() {
        let mut weather = WeatherConfig::default();
        assert!(!weather.enabled());
        weather.api_key = Some("  ".to_string());
        assert!(!weather.enabled());
        weather.api_key = Some("abc".to_string());
        assert!(weather.enabled());
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "threshold_watts: 900\ncontrols:\n  counter_reset: on_disengage\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.threshold_watts, 900);
        assert_eq!(config.controls.counter_reset, CounterResetPolicy::OnDisengage);
        assert_eq!(config.minimum_on_time_minutes, 1.0);
    }

    #[test]
    fn test_oversized_durations_are_rejected() {
        let mut config = Config::default();
        config.interval_minutes = 1e18;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            SwitcherError::Validation { ref field, .. } if field == "interval_minutes"
        ));
        assert_eq!(config.interval(), Duration::MAX);

        let mut config = Config::default();
        config.minimum_on_time_minutes = 1e18;
        config.maximum_on_time_minutes = 2e18;
        assert!(config.validate().is_err());
    }
}
