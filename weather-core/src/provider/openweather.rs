use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::{
    config::ProviderConfig,
    error::LookupError,
    icon::WeatherIcon,
    model::{Units, WeatherReport, WeatherRequest},
};

use super::WeatherProvider;

const CURRENT_WEATHER_PATH: &str = "/data/2.5/weather";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    units: Units,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, units: Units, config: &ProviderConfig) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        let http = builder.build().context("Failed to build HTTP client for OpenWeather")?;

        Ok(Self {
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units,
            http,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}{CURRENT_WEATHER_PATH}", self.base_url)
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self, request), fields(city = %request.city, units = %self.units))]
    async fn current_weather(
        &self,
        request: &WeatherRequest,
    ) -> Result<WeatherReport, LookupError> {
        debug!("Fetching current weather");

        let res = self
            .http
            .get(self.endpoint())
            .query(&[
                ("q", request.city.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| LookupError::Transport(e.to_string()))?;

        // OpenWeather reports failures inside the body (`cod`), so the HTTP
        // status alone is not consulted.
        let status = res.status();
        let body = res.text().await.map_err(|e| LookupError::Transport(e.to_string()))?;

        debug!(%status, bytes = body.len(), "Received OpenWeather response");

        parse_current(&body, &request.city, self.units)
    }
}

#[derive(Debug, Deserialize)]
struct OwEnvelope {
    #[serde(default)]
    cod: Option<Value>,
    #[serde(default)]
    message: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    name: String,
    #[serde(default)]
    dt: Option<i64>,
    main: OwMain,
    wind: OwWind,
    sys: OwSys,
    coord: OwCoord,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

/// Turns a raw OpenWeather body into a report or a classified failure.
fn parse_current(body: &str, city: &str, units: Units) -> Result<WeatherReport, LookupError> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        LookupError::MalformedPayload(format!("{e} (body: {})", truncate_body(body)))
    })?;

    let envelope: OwEnvelope = serde_json::from_value(value.clone())
        .map_err(|e| LookupError::MalformedPayload(e.to_string()))?;

    if let Some(cod) = envelope.cod.as_ref() {
        // Only the string sentinel means "not found"; a numeric 404 is not
        // something OpenWeather sends for a missing city.
        if cod.as_str() == Some("404") {
            return Err(LookupError::NotFound {
                city: city.to_string(),
            });
        }
        let code = value_to_string(cod);
        if code != "200" {
            return Err(LookupError::Provider {
                code,
                message: envelope
                    .message
                    .as_ref()
                    .map(value_to_string)
                    .unwrap_or_default(),
            });
        }
    }

    let parsed: OwCurrentResponse = serde_json::from_value(value)
        .map_err(|e| LookupError::MalformedPayload(e.to_string()))?;

    let icon_code = parsed
        .weather
        .first()
        .map(|w| w.icon.clone())
        .unwrap_or_default();
    let observed_at = parsed.dt.and_then(unix_to_utc).unwrap_or_else(Utc::now);

    Ok(WeatherReport {
        city: parsed.name,
        country: parsed.sys.country,
        lat: parsed.coord.lat,
        lon: parsed.coord.lon,
        temperature: floor_temperature(parsed.main.temp),
        humidity_pct: parsed.main.humidity,
        wind_speed: parsed.wind.speed,
        icon: WeatherIcon::from_code(&icon_code),
        icon_code,
        units,
        observed_at,
    })
}

/// `cod` arrives as a number on success and as a string on failures.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn floor_temperature(temp: f64) -> i32 {
    temp.floor() as i32
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn chennai() -> Value {
        json!({
            "cod": 200,
            "dt": 1_700_000_000,
            "main": { "temp": 30.7, "humidity": 70 },
            "wind": { "speed": 5 },
            "name": "Chennai",
            "sys": { "country": "IN" },
            "coord": { "lat": 13, "lon": 80 },
            "weather": [{ "icon": "01d" }]
        })
    }

    #[test]
    fn success_payload_is_normalized() {
        let report = parse_current(&chennai().to_string(), "Chennai", Units::Metric).unwrap();

        assert_eq!(report.temperature, 30);
        assert_eq!(report.humidity_pct, 70);
        assert!((report.wind_speed - 5.0).abs() < f64::EPSILON);
        assert_eq!(report.city, "Chennai");
        assert_eq!(report.country, "IN");
        assert!((report.lat - 13.0).abs() < f64::EPSILON);
        assert!((report.lon - 80.0).abs() < f64::EPSILON);
        assert_eq!(report.icon, WeatherIcon::Clear);
        assert_eq!(report.observed_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn temperature_is_floored_not_rounded() {
        assert_eq!(floor_temperature(30.99), 30);
        assert_eq!(floor_temperature(0.0), 0);
        assert_eq!(floor_temperature(-0.5), -1);
        assert_eq!(floor_temperature(-3.2), -4);
    }

    #[test]
    fn string_404_is_not_found() {
        let body = r#"{"cod":"404","message":"city not found"}"#;
        let err = parse_current(body, "Zzzz", Units::Metric).unwrap_err();

        assert!(matches!(err, LookupError::NotFound { ref city } if city == "Zzzz"));
    }

    #[test]
    fn other_codes_are_provider_errors() {
        let body = r#"{"cod":401,"message":"Invalid API key"}"#;
        let err = parse_current(body, "Oslo", Units::Metric).unwrap_err();

        match err {
            LookupError::Provider { code, message } => {
                assert_eq!(code, "401");
                assert_eq!(message, "Invalid API key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn numeric_404_is_a_provider_error_not_not_found() {
        let err = parse_current(r#"{"cod":404}"#, "Zzzz", Units::Metric).unwrap_err();

        assert!(!err.is_not_found());
        assert!(matches!(err, LookupError::Provider { ref code, .. } if code == "404"));
    }

    #[test]
    fn non_json_body_is_malformed() {
        let err = parse_current("<html>bad gateway</html>", "Oslo", Units::Metric).unwrap_err();
        assert!(matches!(err, LookupError::MalformedPayload(_)));
    }

    #[test]
    fn missing_fields_are_malformed() {
        let body = r#"{"cod":200,"name":"Oslo"}"#;
        let err = parse_current(body, "Oslo", Units::Metric).unwrap_err();
        assert!(matches!(err, LookupError::MalformedPayload(_)));
    }

    #[test]
    fn empty_weather_list_uses_default_icon() {
        let mut body = chennai();
        body["weather"] = json!([]);

        let report = parse_current(&body.to_string(), "Chennai", Units::Metric).unwrap();
        assert_eq!(report.icon, WeatherIcon::Clear);
        assert_eq!(report.icon_code, "");
    }

    #[test]
    fn unknown_icon_code_uses_default_icon() {
        let mut body = chennai();
        body["weather"] = json!([{ "icon": "11d" }]);

        let report = parse_current(&body.to_string(), "Chennai", Units::Metric).unwrap();
        assert_eq!(report.icon, WeatherIcon::Clear);
        assert_eq!(report.icon_code, "11d");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
    }
}
