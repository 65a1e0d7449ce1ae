use crate::config::WeatherConfig;
use crate::error::{Result, SwitcherError};

use super::ForecastSource;
use super::types::ForecastDocument;

#[cfg(feature = "weather")]
use crate::logging::get_logger;

/// OpenWeatherMap One Call client
pub struct OpenWeatherMapClient {
    base_url: String,
    api_key: String,
    lat: f64,
    lon: f64,
    #[cfg(feature = "weather")]
    http: reqwest::Client,
    #[cfg(feature = "weather")]
    logger: crate::logging::StructuredLogger,
}

impl OpenWeatherMapClient {
    /// Create a client for the configured location
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SwitcherError::config("weather.api_key is not set"))?
            .to_string();

        #[cfg(feature = "weather")]
        {
            let http = reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds.max(1)))
                .build()?;
            Ok(Self {
                base_url: config.base_url.clone(),
                api_key,
                lat: config.lat,
                lon: config.lon,
                http,
                logger: get_logger("weather"),
            })
        }
        #[cfg(not(feature = "weather"))]
        {
            Ok(Self {
                base_url: config.base_url.clone(),
                api_key,
                lat: config.lat,
                lon: config.lon,
            })
        }
    }

    /// Request URL including credentials
    pub fn request_url(&self) -> String {
        format!(
            "{}?exclude=minutely,daily&lat={}&lon={}&appid={}",
            self.base_url.trim_end_matches('?'),
            self.lat,
            self.lon,
            self.api_key
        )
    }
}

#[async_trait::async_trait]
impl ForecastSource for OpenWeatherMapClient {
    #[cfg(feature = "weather")]
    async fn fetch_forecast(&self) -> Result<ForecastDocument> {
        use reqwest::header::{ACCEPT, USER_AGENT};

        let resp = self
            .http
            .get(self.request_url())
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, concat!("pv-switcher/", env!("APP_VERSION")))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            self.logger
                .debug(&format!("OpenWeatherMap returned HTTP {}", status));
            return Err(SwitcherError::api(format!(
                "OpenWeatherMap API error: {}",
                status
            )));
        }

        let body = resp.text().await?;
        let doc: ForecastDocument = serde_json::from_str(&body)?;
        self.logger.trace(&format!(
            "Forecast with {} hourly entries at {}",
            doc.hourly.len(),
            doc.current.dt
        ));
        Ok(doc)
    }

    #[cfg(not(feature = "weather"))]
    async fn fetch_forecast(&self) -> Result<ForecastDocument> {
        Err(SwitcherError::api(
            "Weather support not compiled in (enable the `weather` feature)",
        ))
    }
}
