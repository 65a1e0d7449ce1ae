//! Forecast-based admission gate
//!
//! Weather is a secondary refinement only: when the gate is disabled, the
//! query fails, or the forecast has no entry for the coming hour, the gate
//! admits. It refuses only when sunset is too close or the next hour is
//! forecast fully overcast.

use crate::config::Config;
use crate::error::Result;
use crate::logging::get_logger;

pub mod client;
pub mod types;

pub use client::OpenWeatherMapClient;
pub use types::{Assessment, CurrentObservation, ForecastDocument, HourlyForecast};

/// Seconds an hourly entry may lie ahead of the observation
const NEXT_HOUR_WINDOW_SECS: i64 = 3600;

/// Cloud cover at which the next hour counts as overcast
const OVERCAST_PERCENT: u32 = 100;

/// Source of forecast documents
#[async_trait::async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self) -> Result<ForecastDocument>;
}

/// Apply the stability rule to a forecast
///
/// Stable when sunset is more than two minimum-on periods away and the
/// next hour is not fully overcast.
pub fn assess_forecast(doc: &ForecastDocument, minimum_on_time_minutes: f64) -> Assessment {
    let now = doc.current.dt;
    let Some((next_hour, secs_ahead)) = doc.hourly.iter().find_map(|h| {
        h.dt.checked_sub(now)
            .filter(|ahead| (0..NEXT_HOUR_WINDOW_SECS).contains(ahead))
            .map(|ahead| (h, ahead))
    }) else {
        return Assessment::NoNextHour;
    };
    // Timestamps come straight from the API; nonsense values admit
    let Some(secs_to_sundown) = doc.current.sunset.checked_sub(now) else {
        return Assessment::NoNextHour;
    };

    let minutes_to_sundown = secs_to_sundown / 60;
    let minutes_ahead = secs_ahead / 60;
    let stable = (minutes_to_sundown as f64) > 2.0 * minimum_on_time_minutes
        && next_hour.clouds < OVERCAST_PERCENT;

    Assessment::Evaluated {
        minutes_to_sundown,
        minutes_ahead,
        clouds: next_hour.clouds,
        stable,
    }
}

/// Optional weather admission check
pub struct WeatherGate {
    source: Option<Box<dyn ForecastSource>>,
    minimum_on_time_minutes: f64,
    logger: crate::logging::StructuredLogger,
}

impl WeatherGate {
    /// Gate that always admits
    pub fn disabled() -> Self {
        Self {
            source: None,
            minimum_on_time_minutes: 0.0,
            logger: get_logger("weather"),
        }
    }

    /// Gate backed by a forecast source
    pub fn new(source: Box<dyn ForecastSource>, minimum_on_time_minutes: f64) -> Self {
        Self {
            source: Some(source),
            minimum_on_time_minutes,
            logger: get_logger("weather"),
        }
    }

    /// OpenWeatherMap gate when credentials are configured, disabled otherwise
    pub fn from_config(config: &Config) -> Self {
        if !config.weather.enabled() {
            return Self::disabled();
        }
        match OpenWeatherMapClient::new(&config.weather) {
            Ok(client) => Self::new(Box::new(client), config.minimum_on_time_minutes),
            Err(e) => {
                get_logger("weather").warn(&format!(
                    "Weather gate disabled, client could not be created: {}",
                    e
                ));
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.source.is_some()
    }

    /// Whether conditions look stable enough to switch on
    ///
    /// Never fails: any query or decoding error admits.
    pub async fn is_stable(&self, currently_over_threshold: bool) -> bool {
        let Some(source) = &self.source else {
            return true;
        };

        let doc = match source.fetch_forecast().await {
            Ok(doc) => doc,
            Err(e) => {
                self.logger
                    .warn(&format!("Error getting weather prediction: {}", e));
                return true;
            }
        };

        let assessment = assess_forecast(&doc, self.minimum_on_time_minutes);
        match assessment {
            Assessment::NoNextHour => self.logger.debug(&format!(
                "No forecast within the next hour (over threshold: {}), admitting",
                currently_over_threshold
            )),
            Assessment::Evaluated {
                minutes_to_sundown,
                minutes_ahead,
                clouds,
                stable,
            } => self.logger.debug(&format!(
                "Sundown in {} minutes, expected clouds in {} mins = {} (over threshold: {}) ==> OK?: {}",
                minutes_to_sundown, minutes_ahead, clouds, currently_over_threshold, stable
            )),
        }
        assessment.admits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SwitcherError;

    const NOW: i64 = 1_700_000_000;

    fn doc(sunset_in_min: i64, hourly: &[(i64, u32)]) -> ForecastDocument {
        ForecastDocument {
            current: CurrentObservation {
                dt: NOW,
                sunset: NOW + sunset_in_min * 60,
            },
            hourly: hourly
                .iter()
                .map(|(offset, clouds)| HourlyForecast {
                    dt: NOW + offset,
                    clouds: *clouds,
                })
                .collect(),
        }
    }

    struct StaticSource(Option<ForecastDocument>);

    #[async_trait::async_trait]
    impl ForecastSource for StaticSource {
        async fn fetch_forecast(&self) -> Result<ForecastDocument> {
            self.0
                .clone()
                .ok_or_else(|| SwitcherError::network("connection refused"))
        }
    }

    #[test]
    fn picks_first_entry_within_the_hour() {
        let d = doc(300, &[(-1800, 100), (1200, 40), (4800, 100)]);
        assert_eq!(
            assess_forecast(&d, 1.0),
            Assessment::Evaluated {
                minutes_to_sundown: 300,
                minutes_ahead: 20,
                clouds: 40,
                stable: true,
            }
        );
    }

    #[test]
    fn overcast_next_hour_refuses() {
        let d = doc(300, &[(600, 100)]);
        assert!(!assess_forecast(&d, 1.0).admits());
    }

    #[test]
    fn close_sunset_refuses() {
        // Exactly two periods away is not enough
        let d = doc(2, &[(600, 10)]);
        assert!(!assess_forecast(&d, 1.0).admits());
        let d = doc(3, &[(600, 10)]);
        assert!(assess_forecast(&d, 1.0).admits());
    }

    #[test]
    fn exhausted_forecast_admits() {
        let d = doc(-60, &[(-600, 100), (3600, 100)]);
        assert_eq!(assess_forecast(&d, 1.0), Assessment::NoNextHour);
        assert!(assess_forecast(&d, 1.0).admits());

        let empty = doc(-60, &[]);
        assert!(assess_forecast(&empty, 1.0).admits());
    }

    #[test]
    fn extreme_timestamps_admit() {
        let d = ForecastDocument {
            current: CurrentObservation {
                dt: -10,
                sunset: i64::MAX,
            },
            hourly: vec![HourlyForecast { dt: 0, clouds: 10 }],
        };
        assert_eq!(assess_forecast(&d, 1.0), Assessment::NoNextHour);

        let d = ForecastDocument {
            current: CurrentObservation {
                dt: i64::MAX,
                sunset: i64::MIN,
            },
            hourly: vec![HourlyForecast {
                dt: i64::MIN,
                clouds: 100,
            }],
        };
        assert!(assess_forecast(&d, 1.0).admits());
    }

    #[test]
    fn document_deserializes_from_one_call_json() {
        let json = r#"{
            "lat": 50.77, "lon": 6.61,
            "current": {"dt": 1700000000, "sunrise": 1699990000, "sunset": 1700010000, "clouds": 20},
            "hourly": [{"dt": 1700002800, "temp": 280.1, "clouds": 75}]
        }"#;
        let parsed: ForecastDocument = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.current.sunset, 1_700_010_000);
        assert_eq!(parsed.hourly[0].clouds, 75);
    }

    #[tokio::test]
    async fn disabled_gate_always_admits() {
        let gate = WeatherGate::disabled();
        assert!(!gate.is_enabled());
        assert!(gate.is_stable(true).await);
        assert!(gate.is_stable(false).await);
    }

    #[tokio::test]
    async fn query_failure_admits() {
        let gate = WeatherGate::new(Box::new(StaticSource(None)), 1.0);
        assert!(gate.is_enabled());
        assert!(gate.is_stable(true).await);
        assert!(gate.is_stable(false).await);
    }

    #[tokio::test]
    async fn enabled_gate_applies_rule() {
        let gate = WeatherGate::new(Box::new(StaticSource(Some(doc(300, &[(600, 100)])))), 1.0);
        assert!(!gate.is_stable(true).await);
    }

    #[test]
    fn gate_from_default_config_is_disabled() {
        assert!(!WeatherGate::from_config(&Config::default()).is_enabled());
    }
}
