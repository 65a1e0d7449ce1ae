//! Effective switching threshold
//!
//! The configured base threshold is scaled by the factor for the current
//! day of year and truncated toward zero.

use crate::logging::get_logger;
use crate::scaling::ScalingTable;
use std::sync::Arc;

/// Combines the base threshold with the day's scaling factor
#[derive(Debug, Clone)]
pub struct ThresholdCalculator {
    base_threshold: u32,
    table: Arc<ScalingTable>,
    logger: crate::logging::StructuredLogger,
}

impl ThresholdCalculator {
    pub fn new(base_threshold: u32, table: Arc<ScalingTable>) -> Self {
        Self {
            base_threshold,
            table,
            logger: get_logger("threshold"),
        }
    }

    pub fn base_threshold(&self) -> u32 {
        self.base_threshold
    }

    /// Threshold in Watts for a 1-based day of year
    pub fn effective_threshold(&self, day_of_year: u32) -> u32 {
        let factor = self.table.factor_for_day(day_of_year);
        let scaled = f64::from(self.base_threshold) * factor;
        // `as` saturates and maps NaN to 0
        let threshold = scaled.trunc() as u32;
        self.logger.debug(&format!(
            "Day {}, scaling factor {} ==> threshold {}",
            day_of_year, factor, threshold
        ));
        threshold
    }
}
