use serde::{Deserialize, Serialize};

/// Subset of the One Call response used by the gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDocument {
    pub current: CurrentObservation,
    pub hourly: Vec<HourlyForecast>,
}

/// Current conditions (unix seconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentObservation {
    pub dt: i64,
    pub sunset: i64,
}

/// One hourly forecast entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub dt: i64,
    /// Cloud cover in percent
    pub clouds: u32,
}

/// Outcome of the stability rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// No forecast entry within the next hour; admitted
    NoNextHour,
    Evaluated {
        minutes_to_sundown: i64,
        minutes_ahead: i64,
        clouds: u32,
        stable: bool,
    },
}

impl Assessment {
    pub fn admits(&self) -> bool {
        match self {
            Assessment::NoNextHour => true,
            Assessment::Evaluated { stable, .. } => *stable,
        }
    }
}
