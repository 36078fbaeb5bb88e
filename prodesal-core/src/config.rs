use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// The three opaque API keys the dashboard can be configured with.
///
/// Field names in the persisted file are the same stable keys the dashboard
/// has always used, so an existing configuration keeps working. An absent key
/// means the corresponding provider serves its static fallback.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Credentials {
    /// OpenWeather key, used by the weather provider.
    #[serde(rename = "openWeatherApiKey", skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,

    /// NewsAPI key, used by the news provider.
    #[serde(rename = "newsApiKey", skip_serializing_if = "Option::is_none")]
    pub news: Option<String>,

    /// Reserved for future integrations (INIA, ODEPA).
    #[serde(rename = "customApiKey", skip_serializing_if = "Option::is_none")]
    pub custom: Option<String>,
}

impl Credentials {
    pub fn has_weather(&self) -> bool {
        self.weather.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn has_news(&self) -> bool {
        self.news.as_deref().is_some_and(|k| !k.is_empty())
    }

    pub fn weather_key(&self) -> Option<&str> {
        self.weather.as_deref().filter(|k| !k.is_empty())
    }

    pub fn news_key(&self) -> Option<&str> {
        self.news.as_deref().filter(|k| !k.is_empty())
    }
}

/// Fields collected by the administration form. `None` or an empty string
/// leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct CredentialUpdate {
    pub weather: Option<String>,
    pub news: Option<String>,
    pub custom: Option<String>,
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(flatten)]
    pub credentials: Credentials,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("cl", "prodesal-castro", "prodesal")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply an administration-form update: non-empty provided fields replace
    /// the stored value, everything else is left as it was.
    pub fn apply_update(&mut self, update: CredentialUpdate) {
        let CredentialUpdate { weather, news, custom } = update;

        if let Some(key) = weather.filter(|k| !k.is_empty()) {
            self.credentials.weather = Some(key);
        }
        if let Some(key) = news.filter(|k| !k.is_empty()) {
            self.credentials.news = Some(key);
        }
        if let Some(key) = custom.filter(|k| !k.is_empty()) {
            self.credentials.custom = Some(key);
        }
    }
}
