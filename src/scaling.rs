//! Day-of-year scaling factors
//!
//! The scaling file holds one floating-point factor per line. Line 1 is
//! day-of-year 1 (January 1st), line 366 the last day of a leap year.
//! Malformed, blank, negative or non-finite lines are skipped, so a factor
//! following such a line moves up one day. Days past the end of the
//! table use a factor of 1.

use crate::error::Result;
use crate::logging::get_logger;
use std::path::Path;

/// Factor applied when a day has no entry
pub const DEFAULT_FACTOR: f64 = 1.0;

/// Ordered factors indexed by day-of-year
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScalingTable {
    factors: Vec<f64>,
}

impl ScalingTable {
    /// Build a table directly from factors, first entry is day 1
    pub fn from_factors(factors: Vec<f64>) -> Self {
        Self { factors }
    }

    /// Parse newline-separated factors, skipping malformed lines
    pub fn parse(contents: &str) -> Self {
        let factors = contents
            .lines()
            .filter_map(|line| line.trim().parse::<f64>().ok())
            .filter(|f| f.is_finite() && *f >= 0.0)
            .collect();
        Self { factors }
    }

    /// Read the table from a file
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&contents))
    }

    /// Load the table, falling back to an empty table on any error
    pub async fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        let logger = get_logger("scaling");
        let path = path.as_ref();
        match Self::from_file(path).await {
            Ok(table) => {
                logger.info(&format!(
                    "Loaded {} scaling factors from {}",
                    table.len(),
                    path.display()
                ));
                table
            }
            Err(e) => {
                logger.warn(&format!(
                    "Could not load scaling factors from {} ({}), using factor {} for every day",
                    path.display(),
                    e,
                    DEFAULT_FACTOR
                ));
                Self::default()
            }
        }
    }

    /// Factor for a 1-based day of year
    pub fn factor_for_day(&self, day_of_year: u32) -> f64 {
        day_of_year
            .checked_sub(1)
            .and_then(|idx| self.factors.get(idx as usize))
            .copied()
            .unwrap_or(DEFAULT_FACTOR)
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }
}
