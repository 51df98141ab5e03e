use crate::cache::ResponseCache;
use crate::retry::{with_retry_if, RetryConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum OpenMeteoError {
    #[error("request to Open-Meteo failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Open-Meteo API error ({status}): {reason}")]
    Api { status: u16, reason: String },

    #[error("failed to parse Open-Meteo response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl OpenMeteoError {
    /// Server errors, rate limiting and transport failures are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            OpenMeteoError::Http(e) => !e.is_builder(),
            OpenMeteoError::Api { status, .. } => *status >= 500 || *status == 429,
            OpenMeteoError::Parse(_) => false,
        }
    }
}

/// Error body returned by the API for rejected requests
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    reason: String,
}

/// Forecast response for a single location.
///
/// `current` and `daily` keep the provider's per-field values untouched;
/// the payload module decides how to present them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastResponse {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub timezone_abbreviation: String,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub current: Option<Map<String, Value>>,
    #[serde(default)]
    pub daily: Option<Map<String, Value>>,
}

pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
    cache: Option<ResponseCache>,
    retry: RetryConfig,
}

impl OpenMeteoClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            cache: None,
            retry: RetryConfig::open_meteo(),
        }
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Fetch the forecast described by `params` (Open-Meteo query parameters).
    pub async fn fetch(&self, params: &Map<String, Value>) -> Result<ForecastResponse, OpenMeteoError> {
        let url = self
            .http
            .get(&self.base_url)
            .query(&query_pairs(params))
            .build()?
            .url()
            .clone();
        debug!("Request Open-Meteo API {}", url);

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url.as_str()).await {
                info!("Using cached Open-Meteo response");
                return Ok(serde_json::from_str(&body)?);
            }
        }

        let body = with_retry_if(
            &self.retry,
            "Open-Meteo request",
            || async {
                let response = self
                    .http
                    .get(url.clone())
                    .timeout(Duration::from_secs(30))
                    .send()
                    .await?;

                let status = response.status();
                let body = response.text().await?;
                if !status.is_success() {
                    let reason = serde_json::from_str::<ApiErrorBody>(&body)
                        .map(|e| e.reason)
                        .unwrap_or(body);
                    return Err(OpenMeteoError::Api {
                        status: status.as_u16(),
                        reason,
                    });
                }
                Ok(body)
            },
            OpenMeteoError::is_retryable,
        )
        .await?;

        let forecast: ForecastResponse = serde_json::from_str(&body)?;

        if let Some(cache) = &self.cache {
            cache.put(url.as_str(), &body).await;
        }

        debug!("Received weather data from Open-Meteo API: {}", body);
        Ok(forecast)
    }
}

/// Convert request parameters into query pairs.
///
/// Lists become comma-separated values, `null` parameters are dropped.
pub fn query_pairs(params: &Map<String, Value>) -> Vec<(String, String)> {
    params
        .iter()
        .filter_map(|(key, value)| query_value(value).map(|v| (key.clone(), v)))
        .collect()
}

fn query_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(query_value)
                .collect::<Vec<_>>()
                .join(","),
        ),
        other => Some(other.to_string()),
    }
}
