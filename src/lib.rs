//! # PV Switcher - photovoltaic surplus relay control
//!
//! Switches a single load (typically a water heater) on a relay whenever the
//! inverter reports more power than a day-of-year adjusted threshold, with
//! an optional weather check and hysteresis that caps ON time per day.
//!
//! ## Architecture
//!
//! - `config`: YAML configuration, defaults and validation
//! - `logging`: Structured logging and tracing
//! - `clock`: Calendar day handling
//! - `scaling`: Day-of-year scaling factors
//! - `threshold`: Effective threshold computation
//! - `modbus`: Modbus TCP client and register decoding
//! - `meter`: Power meters and aggregation
//! - `weather`: Forecast admission gate
//! - `relay`: GPIO and dry-run relay outputs
//! - `controller`: On/off hysteresis state machine
//! - `cycle_log`: Per-cycle decision log
//! - `engine`: Main loop with cancellation

pub mod clock;
pub mod config;
pub mod controller;
pub mod cycle_log;
pub mod engine;
pub mod error;
pub mod logging;
pub mod meter;
pub mod modbus;
pub mod relay;
pub mod scaling;
pub mod threshold;
pub mod weather;

// Re-export commonly used types
pub use config::Config;
pub use engine::Switcher;
pub use error::{Result, SwitcherError};
