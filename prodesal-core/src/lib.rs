//! Core library for the PRODESAL Castro dashboard.
//!
//! This crate defines:
//! - Credential handling for the external data services
//! - Weather and news providers with static fallbacks
//! - Derived late-blight station readings and market prices
//! - The refresh scheduler that keeps every feed on a displayable value
//!
//! It is used by `prodesal-cli`, but can also be reused by other front ends.

pub mod admin;
pub mod config;
pub mod error;
pub mod market;
pub mod model;
pub mod monitor;
pub mod provider;
pub mod refresh;

pub use config::{Config, CredentialUpdate, Credentials};
pub use error::FetchError;
pub use model::{
    MarketEntry, NewsArticle, Notice, RiskLevel, Severity, StationReading, StationStatus, Trend,
    WeatherReading,
};
pub use provider::{Feed, NewsProvider, Probe, WeatherProvider};
pub use refresh::{Dashboard, FeedState};
