use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;
use crate::model::WeatherReading;

use super::{Probe, truncate_body};

/// Fixed query for the program area (Chiloé, Chile).
pub const LOCATION_QUERY: &str = "Castro, CL";

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Source reports visibility in meters and may omit the field entirely.
const DEFAULT_VISIBILITY_M: f64 = 10_000.0;

/// Fetches current conditions for Castro from OpenWeather and normalizes them
/// to display units (°C, km/h, km).
#[derive(Debug, Clone)]
pub struct WeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Point the provider at a different endpoint (test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// One outbound request for current conditions. Any failure (transport,
    /// non-2xx status, unparseable body) is reported to the caller, which owns
    /// the fallback decision.
    pub async fn current(&self) -> Result<WeatherReading, FetchError> {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("q", LOCATION_QUERY),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "es"),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Http { service: "OpenWeather", source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Http { service: "OpenWeather", source })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                service: "OpenWeather",
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: OwResponse = serde_json::from_str(&body)
            .map_err(|source| FetchError::Malformed { service: "OpenWeather", source })?;

        Ok(normalize(parsed, Utc::now()))
    }
}

/// Static reading served when no key is configured or the source is down.
pub fn fallback_reading() -> WeatherReading {
    WeatherReading {
        temperature_c: 18,
        condition: "Lluvia ligera".to_string(),
        humidity_pct: 85,
        wind_speed_kmh: 12,
        pressure_hpa: 1013,
        visibility_km: 8,
        raw_description: "lluvia ligera".to_string(),
        icon: "10d".to_string(),
        location: "Castro, Chiloé".to_string(),
        captured_at: Utc::now(),
    }
}

fn normalize(raw: OwResponse, captured_at: DateTime<Utc>) -> WeatherReading {
    let description = raw
        .weather
        .first()
        .map(|w| w.description.clone())
        .unwrap_or_default();
    let icon = raw.weather.first().map(|w| w.icon.clone()).unwrap_or_default();

    WeatherReading {
        temperature_c: raw.main.temp.round() as i32,
        condition: translate_condition(&description),
        humidity_pct: raw.main.humidity,
        // m/s to km/h
        wind_speed_kmh: (raw.wind.speed * 3.6).round() as i32,
        pressure_hpa: raw.main.pressure,
        // meters to km
        visibility_km: (raw.visibility.unwrap_or(DEFAULT_VISIBILITY_M) / 1000.0).round() as i32,
        raw_description: description,
        icon,
        location: raw.name,
        captured_at,
    }
}

/// Translate the condition phrases OpenWeather emits for this region.
/// Phrases outside the table pass through unchanged.
fn translate_condition(raw: &str) -> String {
    let translated = match raw {
        "clear sky" => "Cielo despejado",
        "few clouds" => "Pocas nubes",
        "scattered clouds" => "Nubes dispersas",
        "broken clouds" => "Nublado",
        "shower rain" => "Lluvia intensa",
        "rain" => "Lluvia",
        "thunderstorm" => "Tormenta",
        "snow" => "Nieve",
        "mist" => "Neblina",
        "fog" => "Niebla",
        "overcast clouds" => "Nublado",
        "light rain" => "Lluvia ligera",
        "moderate rain" => "Lluvia moderada",
        "heavy rain" => "Lluvia intensa",
        other => other,
    };

    translated.to_string()
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    humidity: u8,
    pressure: u32,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
    #[serde(default)]
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwResponse {
    name: String,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
    visibility: Option<f64>,
}

#[async_trait]
impl Probe for WeatherProvider {
    async fn probe(&self) -> bool {
        let url = format!("{}/weather", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("q", LOCATION_QUERY), ("appid", self.api_key.as_str())])
            .send()
            .await;

        match res {
            Ok(res) => res.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "weather probe failed");
                false
            }
        }
    }
}
