//! Power meters and aggregation
//!
//! Each configured meter is read once per cycle. A meter that fails to
//! answer contributes 0 W, so a dead sensor looks exactly like "no surplus"
//! and never aborts the cycle. There are no retries within a cycle.

use crate::config::MeterConfig;
use crate::error::Result;
use crate::logging::{LogContext, StructuredLogger, get_logger, get_logger_with_context};
use crate::modbus::{ModbusClient, decode_power_watts};
use std::time::Duration;

/// Source of instantaneous power readings
#[async_trait::async_trait]
pub trait PowerMeter: Send + Sync {
    /// Label used in logs
    fn name(&self) -> &str;

    /// Current power in Watts
    async fn read_power(&mut self) -> Result<u32>;
}

/// Meter read over Modbus TCP, connecting for every read
pub struct ModbusMeter {
    config: MeterConfig,
    connection_timeout: Duration,
    operation_timeout: Duration,
}

impl ModbusMeter {
    pub fn new(config: MeterConfig) -> Self {
        Self {
            config,
            connection_timeout: Duration::from_secs(5),
            operation_timeout: Duration::from_secs(2),
        }
    }
}

#[async_trait::async_trait]
impl PowerMeter for ModbusMeter {
    fn name(&self) -> &str {
        &self.config.name
    }

    async fn read_power(&mut self) -> Result<u32> {
        let mut client = ModbusClient::new(&self.config.host, self.config.port)
            .with_timeouts(self.connection_timeout, self.operation_timeout);
        client.connect().await?;
        let registers = client
            .read_holding_registers(
                self.config.unit_id,
                self.config.register,
                self.config.format.word_count(),
            )
            .await;
        client.disconnect();
        decode_power_watts(&registers?, self.config.format)
    }
}

/// One cycle's readings, in meter configuration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerReading {
    pub per_meter: Vec<u32>,
    pub total: u32,
}

impl PowerReading {
    pub fn from_samples(per_meter: Vec<u32>) -> Self {
        let total = per_meter.iter().fold(0u32, |acc, w| acc.saturating_add(*w));
        Self { per_meter, total }
    }
}

/// Sums readings from every configured meter
pub struct PowerAggregator {
    meters: Vec<Box<dyn PowerMeter>>,
    loggers: Vec<StructuredLogger>,
    logger: StructuredLogger,
}

impl PowerAggregator {
    pub fn new(meters: Vec<Box<dyn PowerMeter>>) -> Self {
        let loggers = meters
            .iter()
            .map(|m| {
                get_logger_with_context(
                    LogContext::new("meter").with_field("meter", m.name().to_string()),
                )
            })
            .collect();
        Self {
            meters,
            loggers,
            logger: get_logger("power"),
        }
    }

    /// Build Modbus meters from configuration
    pub fn from_config(configs: &[MeterConfig]) -> Self {
        let meters = configs
            .iter()
            .cloned()
            .map(|c| Box::new(ModbusMeter::new(c)) as Box<dyn PowerMeter>)
            .collect();
        Self::new(meters)
    }

    pub fn meter_count(&self) -> usize {
        self.meters.len()
    }

    /// Read every meter once; failures count as 0 W
    pub async fn read_total_power(&mut self) -> PowerReading {
        let mut samples = Vec::with_capacity(self.meters.len());
        for (meter, logger) in self.meters.iter_mut().zip(&self.loggers) {
            let watts = match meter.read_power().await {
                Ok(w) => {
                    logger.trace(&format!("Read {} W", w));
                    w
                }
                Err(e) => {
                    logger.warn(&format!("Power read failed, counting 0 W: {}", e));
                    0
                }
            };
            samples.push(watts);
        }
        let reading = PowerReading::from_samples(samples);
        self.logger.debug(&format!(
            "Total power {} W from {:?}",
            reading.total, reading.per_meter
        ));
        reading
    }
}
