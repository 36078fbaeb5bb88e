use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Current conditions for the program area, normalized to display units.
///
/// Replaced wholesale on every successful fetch (or fallback construction);
/// never partially updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_c: i32,
    /// Localized condition text, e.g. "Lluvia ligera".
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_speed_kmh: i32,
    pub pressure_hpa: u32,
    pub visibility_km: i32,
    /// Condition text as the source reported it, before translation.
    pub raw_description: String,
    pub icon: String,
    pub location: String,
    pub captured_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub description: Option<String>,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub image_url: Option<String>,
}

/// One monitoring-station card for the late-blight view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationReading {
    pub station: String,
    pub location: String,
    pub status: StationStatus,
    pub risk: RiskLevel,
    pub temperature_c: i32,
    pub humidity_pct: u8,
    pub last_update: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StationStatus {
    Green,
}

impl StationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StationStatus::Green => "VERDE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
}

impl RiskLevel {
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "BAJO",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEntry {
    pub product: String,
    pub price: u32,
    pub unit: String,
    pub trend: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn arrow(&self) -> &'static str {
        match self {
            Trend::Up => "↗",
            Trend::Down => "↘",
            Trend::Stable => "→",
        }
    }
}

/// Transient user-facing message. The presentation layer decides how to show
/// it; `duration` is how long it should stay visible.
#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub duration: Duration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
    Error,
}

const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(5);

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>, duration: Duration) -> Self {
        Self { severity, message: message.into(), duration }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message, DEFAULT_NOTICE_DURATION)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message, DEFAULT_NOTICE_DURATION)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message, DEFAULT_NOTICE_DURATION)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message, DEFAULT_NOTICE_DURATION)
    }

    pub fn lasting(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }
}
