//! Main loop
//!
//! One cycle computes the day's threshold, reads the meters, asks the
//! weather gate, lets the controller switch the relay and appends the
//! decision to the cycle log. The loop then waits for the dwell (ON) or the
//! poll interval (OFF). Cancellation is checked before every cycle and
//! raced against every wait; on cancellation the relay is disengaged once
//! and `run` returns.

use crate::clock::{self, Zone};
use crate::config::Config;
use crate::controller::{SwitchAction, SwitchController};
use crate::cycle_log::{CycleDecision, CycleLogger};
use crate::error::Result;
use crate::logging::get_logger;
use crate::meter::PowerAggregator;
use crate::relay::open_relay;
use crate::scaling::ScalingTable;
use crate::threshold::ThresholdCalculator;
use crate::weather::WeatherGate;
use chrono::NaiveDateTime;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The switching daemon
pub struct Switcher {
    zone: Zone,
    threshold: ThresholdCalculator,
    power: PowerAggregator,
    weather: WeatherGate,
    controller: SwitchController,
    cycle_log: CycleLogger,
    logger: crate::logging::StructuredLogger,
}

impl Switcher {
    /// Assemble a switcher from ready-made components
    pub fn new(
        zone: Zone,
        threshold: ThresholdCalculator,
        power: PowerAggregator,
        weather: WeatherGate,
        controller: SwitchController,
        cycle_log: CycleLogger,
    ) -> Self {
        Self {
            zone,
            threshold,
            power,
            weather,
            controller,
            cycle_log,
            logger: get_logger("switcher"),
        }
    }

    /// Build every component from configuration
    ///
    /// Only an invalid configuration fails; a missing scaling file, relay or
    /// weather client degrades to its safe default.
    pub async fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let zone = Zone::parse(&config.timezone)?;

        let table = Arc::new(ScalingTable::load_or_default(&config.scaling.file).await);
        let threshold = ThresholdCalculator::new(config.threshold_watts, table);
        let power = PowerAggregator::from_config(&config.meters);
        let weather = WeatherGate::from_config(config);
        let relay = open_relay(&config.relay).await;
        let controller = SwitchController::new(relay, config, zone.now().date());
        let cycle_log = CycleLogger::new(&config.cycle_log.file);

        let switcher = Self::new(zone, threshold, power, weather, controller, cycle_log);
        switcher.log_summary(config);
        Ok(switcher)
    }

    fn log_summary(&self, config: &Config) {
        self.logger.info(&format!(
            "Base power threshold: {} W",
            self.threshold.base_threshold()
        ));
        self.logger.info(&format!(
            "Max. ON time = {} periods of {} minutes each, poll interval {} minutes",
            self.controller.periods(),
            config.minimum_on_time_minutes,
            config.interval_minutes
        ));
        self.logger
            .info(&format!("Power meters: {}", self.power.meter_count()));
        for meter in &config.meters {
            self.logger.info(&format!(
                "Meter '{}' at {}:{} unit {} register {} ({:?})",
                meter.name, meter.host, meter.port, meter.unit_id, meter.register, meter.format
            ));
        }
        self.logger.info(&format!(
            "OpenWeatherMap API enabled: {}",
            self.weather.is_enabled()
        ));
        self.logger
            .info(&format!("Relay: {}", self.controller.relay_description()));
        self.logger.info(&format!(
            "Counter reset policy: {:?}",
            config.controls.counter_reset
        ));
    }

    pub fn controller(&self) -> &SwitchController {
        &self.controller
    }

    /// Run one decision at wall-clock time `now`
    pub async fn run_cycle(&mut self, now: NaiveDateTime) -> (CycleDecision, SwitchAction) {
        let today = now.date();
        let threshold = self
            .threshold
            .effective_threshold(clock::day_of_year(today));
        let reading = self.power.read_total_power().await;
        let weather_admitted = self.weather.is_stable(reading.total > threshold).await;

        let action = self
            .controller
            .step(reading.total, threshold, weather_admitted, today)
            .await;

        let decision = CycleDecision {
            timestamp: now,
            per_meter: reading.per_meter,
            power: reading.total,
            threshold,
            weather_admitted,
            engaged: action.engaged(),
        };
        self.cycle_log.record(&decision).await;
        (decision, action)
    }

    /// Loop until `token` is cancelled, then disengage and return
    pub async fn run(&mut self, token: CancellationToken) {
        self.logger.info("Starting switching loop");

        loop {
            if token.is_cancelled() {
                break;
            }

            let now = self.zone.now();
            let (_, action) = self.run_cycle(now).await;

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(action.wait()) => {}
            }
        }

        self.logger.info("Termination requested");
        self.controller.shutdown().await;
        self.logger.info("Switcher shutdown complete");
    }
}
