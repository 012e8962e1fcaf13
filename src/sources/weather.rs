//! Hazard alerts for a coordinate pair.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::metrics::UpstreamMetrics;
use crate::notification::AlertCandidate;

/// Provider of active weather alerts.
///
/// Failures are swallowed: a source that cannot answer reports no alerts.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn alerts(&self, lat: f64, lng: f64) -> Vec<AlertCandidate>;
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    #[serde(default)]
    alerts: Vec<OneCallAlert>,
}

#[derive(Debug, Deserialize)]
struct OneCallAlert {
    event: String,
    #[serde(default)]
    sender_name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    start: Option<i64>,
    #[serde(default)]
    end: Option<i64>,
}

impl From<OneCallAlert> for AlertCandidate {
    fn from(alert: OneCallAlert) -> Self {
        AlertCandidate {
            event: alert.event,
            description: alert.description,
            starts_at: alert.start.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            ends_at: alert.end.and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0)),
            source: alert.sender_name,
        }
    }
}

/// OpenWeatherMap One Call 3.0 client
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: &str, api_key: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    async fn fetch(&self, lat: f64, lng: f64) -> Result<Vec<AlertCandidate>, reqwest::Error> {
        let url = format!("{}/data/3.0/onecall", self.base_url);
        let response: OneCallResponse = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lng.to_string()),
                ("exclude", "minutely,hourly,daily".to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(response.alerts.into_iter().map(AlertCandidate::from).collect())
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    #[tracing::instrument(name = "weather.alerts", skip(self))]
    async fn alerts(&self, lat: f64, lng: f64) -> Vec<AlertCandidate> {
        match self.fetch(lat, lng).await {
            Ok(alerts) => {
                UpstreamMetrics::record_success("weather");
                alerts
            }
            Err(e) => {
                UpstreamMetrics::record_failure("weather");
                tracing::warn!(error = %e, "Weather lookup failed, treating as no alerts");
                Vec::new()
            }
        }
    }
}
