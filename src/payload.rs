//! MQTT message payload built from a forecast response.
//!
//! Times are rendered in the forecast location's UTC offset, and every
//! `weather_code` series gains a translated `weather_code_text` companion.

use crate::openmeteo::ForecastResponse;
use crate::weather_codes::WeatherCodes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

const WEATHER_CODE: &str = "weather_code";
const WEATHER_CODE_TEXT: &str = "weather_code_text";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimezoneInfo {
    pub name: String,
    pub abbreviation: String,
    pub utc_offset_seconds: i32,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeatherPayload {
    pub location: Location,
    pub timezone: TimezoneInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily: Option<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tomorrow: Option<Map<String, Value>>,
    pub message_timestamp: String,
}

impl WeatherPayload {
    /// Build the payload for `response`, stamped with `now`.
    pub fn build(response: &ForecastResponse, codes: &WeatherCodes, now: DateTime<Utc>) -> Self {
        let offset = utc_offset(response.utc_offset_seconds);

        Self {
            location: Location {
                latitude: response.latitude,
                longitude: response.longitude,
                elevation: response.elevation,
            },
            timezone: TimezoneInfo {
                name: response.timezone.clone(),
                abbreviation: response.timezone_abbreviation.clone(),
                utc_offset_seconds: response.utc_offset_seconds,
            },
            current: response
                .current
                .as_ref()
                .map(|current| parse_current(current, offset, codes)),
            daily: response
                .daily
                .as_ref()
                .map(|daily| parse_daily(daily, offset, codes)),
            tomorrow: None,
            message_timestamp: now.with_timezone(&offset).to_rfc3339(),
        }
    }

    /// Replace the daily series with a flat record for the day after `today`.
    ///
    /// Returns `false` (and leaves the payload alone) when there is no daily data.
    pub fn select_tomorrow(&mut self, today: NaiveDate) -> bool {
        let Some(daily) = self.daily.take() else {
            warn!("No daily forecast in response, cannot select tomorrow");
            return false;
        };

        let date = today.succ_opt().unwrap_or(today).to_string();
        let mut tomorrow = Map::new();
        tomorrow.insert("date".to_string(), Value::String(date.clone()));
        for (field, series) in &daily {
            let value = series.get(&date).cloned().unwrap_or(Value::Null);
            tomorrow.insert(field.clone(), value);
        }

        debug!("Selected forecast for {}", date);
        self.tomorrow = Some(tomorrow);
        true
    }

    /// Today's date at the forecast location
    pub fn local_date(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&utc_offset(self.timezone.utc_offset_seconds))
            .date_naive()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn utc_offset(seconds: i32) -> FixedOffset {
    FixedOffset::east_opt(seconds).unwrap_or_else(|| Utc.fix())
}

/// Render a provider time value in `offset`.
///
/// ISO local times (`2025-04-11T10:00`) and unix timestamps are supported;
/// anything else is passed through unchanged.
fn format_time(value: &Value, offset: FixedOffset) -> Value {
    let formatted = match value {
        Value::String(s) => NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
            .ok()
            .and_then(|naive| naive.and_local_timezone(offset).single())
            .map(|time| time.to_rfc3339()),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|time| time.with_timezone(&offset).to_rfc3339()),
        _ => None,
    };
    formatted.map(Value::String).unwrap_or_else(|| value.clone())
}

/// Render a provider date value (ISO date or unix timestamp) as `YYYY-MM-DD`.
fn format_date(value: &Value, offset: FixedOffset) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n
            .as_i64()
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .map(|time| time.with_timezone(&offset).date_naive().to_string())
            .unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

fn parse_current(current: &Map<String, Value>, offset: FixedOffset, codes: &WeatherCodes) -> Map<String, Value> {
    let mut parsed = Map::new();
    for (field, value) in current {
        match field.as_str() {
            "interval" => {}
            "time" => {
                parsed.insert(field.clone(), format_time(value, offset));
            }
            _ => {
                parsed.insert(field.clone(), value.clone());
            }
        }
    }

    if let Some(code) = current.get(WEATHER_CODE) {
        parsed.insert(
            WEATHER_CODE_TEXT.to_string(),
            Value::String(codes.translate(code).to_string()),
        );
    }
    parsed
}

/// Turn parallel daily arrays into per-field `{date: value}` maps.
fn parse_daily(daily: &Map<String, Value>, offset: FixedOffset, codes: &WeatherCodes) -> Map<String, Value> {
    let dates: Vec<String> = daily
        .get("time")
        .and_then(Value::as_array)
        .map(|times| times.iter().map(|t| format_date(t, offset)).collect())
        .unwrap_or_default();

    let mut parsed = Map::new();
    for (field, series) in daily {
        if field == "time" {
            continue;
        }
        let values = series.as_array().map(Vec::as_slice).unwrap_or_default();
        let by_date: Map<String, Value> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| (date.clone(), values.get(i).cloned().unwrap_or(Value::Null)))
            .collect();

        if field == WEATHER_CODE {
            let texts: Map<String, Value> = by_date
                .iter()
                .map(|(date, code)| (date.clone(), Value::String(codes.translate(code).to_string())))
                .collect();
            parsed.insert(WEATHER_CODE_TEXT.to_string(), Value::Object(texts));
        }
        parsed.insert(field.clone(), Value::Object(by_date));
    }
    parsed
}
