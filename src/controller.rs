//! On/off hysteresis for the relay
//!
//! Each cycle the controller is handed the aggregated power, the effective
//! threshold and the weather verdict. While eligible it engages and asks for
//! a dwell of one minimum-on period before the next decision; otherwise it
//! disengages and asks for the (usually shorter) poll interval. At most
//! `periods = floor(max_on / min_on)` consecutive periods are granted before
//! the counter is cleared again.
//!
//! The counter is cleared only on idle cycles: with the `daily` policy on the
//! first idle cycle of a new calendar day, with `on_disengage` on every idle
//! cycle.

use crate::config::{Config, CounterResetPolicy};
use crate::logging::get_logger;
use crate::relay::Relay;
use chrono::NaiveDate;
use std::time::Duration;

/// What the controller did this cycle and how long to wait before the next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    /// Relay on; hold for one minimum-on period
    Engaged { dwell: Duration },
    /// Relay off; wait one poll interval
    Disengaged { wait: Duration },
}

impl SwitchAction {
    pub fn engaged(&self) -> bool {
        matches!(self, SwitchAction::Engaged { .. })
    }

    /// Time to wait before the next cycle
    pub fn wait(&self) -> Duration {
        match self {
            SwitchAction::Engaged { dwell } => *dwell,
            SwitchAction::Disengaged { wait } => *wait,
        }
    }
}

/// Hysteresis state machine owning the relay
pub struct SwitchController {
    relay: Box<dyn Relay>,
    periods: u32,
    dwell: Duration,
    interval: Duration,
    policy: CounterResetPolicy,

    is_engaged: bool,
    elapsed_on_periods: u32,
    last_reset_day: NaiveDate,
    shut_down: bool,

    logger: crate::logging::StructuredLogger,
}

impl SwitchController {
    /// Controller starting OFF with an empty counter
    pub fn new(relay: Box<dyn Relay>, config: &Config, start_day: NaiveDate) -> Self {
        Self {
            relay,
            periods: config.periods(),
            dwell: config.minimum_on_time(),
            interval: config.interval(),
            policy: config.controls.counter_reset,
            is_engaged: false,
            elapsed_on_periods: 0,
            last_reset_day: start_day,
            shut_down: false,
            logger: get_logger("controller"),
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.is_engaged
    }

    pub fn elapsed_on_periods(&self) -> u32 {
        self.elapsed_on_periods
    }

    pub fn periods(&self) -> u32 {
        self.periods
    }

    pub fn last_reset_day(&self) -> NaiveDate {
        self.last_reset_day
    }

    pub fn relay_description(&self) -> String {
        self.relay.describe()
    }

    /// Surplus, weather and remaining daily budget all allow switching on
    pub fn is_eligible(&self, power: u32, threshold: u32, weather_admitted: bool) -> bool {
        power > threshold && weather_admitted && self.elapsed_on_periods < self.periods
    }

    /// Decide one cycle and drive the relay accordingly
    pub async fn step(
        &mut self,
        power: u32,
        threshold: u32,
        weather_admitted: bool,
        today: NaiveDate,
    ) -> SwitchAction {
        if self.is_eligible(power, threshold, weather_admitted) {
            self.relay.engage().await;
            self.is_engaged = true;
            // Counts the dwell the caller holds before the next step
            self.elapsed_on_periods += 1;
            self.logger.debug(&format!(
                "ON period {}/{} ({} W > {} W)",
                self.elapsed_on_periods, self.periods, power, threshold
            ));
            return SwitchAction::Engaged { dwell: self.dwell };
        }

        if power > threshold && weather_admitted {
            self.logger.debug(&format!(
                "Daily ON budget exhausted ({}/{} periods)",
                self.elapsed_on_periods, self.periods
            ));
        }

        self.relay.disengage().await;
        self.is_engaged = false;
        self.reset_counter_if_due(today);
        SwitchAction::Disengaged {
            wait: self.interval,
        }
    }

    fn reset_counter_if_due(&mut self, today: NaiveDate) {
        let new_day = today != self.last_reset_day;
        let due = match self.policy {
            CounterResetPolicy::Daily => new_day,
            CounterResetPolicy::OnDisengage => true,
        };
        if new_day {
            self.last_reset_day = today;
        }
        if due && self.elapsed_on_periods != 0 {
            self.logger.debug(&format!(
                "Resetting ON counter ({} periods used)",
                self.elapsed_on_periods
            ));
            self.elapsed_on_periods = 0;
        }
    }

    /// Disengage before exit; only the first call touches the relay
    pub async fn shutdown(&mut self) -> bool {
        if self.shut_down {
            return false;
        }
        self.shut_down = true;
        self.logger.info("Shutdown: disengaging relay");
        self.relay.disengage().await;
        self.is_engaged = false;
        true
    }
}
