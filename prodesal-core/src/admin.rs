//! Administration-panel operations: saving API keys and probing the
//! configured providers.

use anyhow::Result;

use crate::config::{CredentialUpdate, Credentials};
use crate::model::Notice;
use crate::provider::{NewsProvider, Probe, WeatherProvider};
use crate::refresh::Dashboard;

/// Per-provider reachability, as reported by [`test_connections`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionReport {
    pub weather: bool,
    pub news: bool,
}

/// Persist the non-empty fields of the form, then reload every provider so
/// the new keys take effect immediately.
pub async fn save_credentials(dashboard: &Dashboard, update: CredentialUpdate) -> Result<()> {
    dashboard.store_credentials(update);
    dashboard.config_snapshot().save()?;
    dashboard.push_notice(Notice::success("Configuración guardada. Recargando datos..."));
    dashboard.refresh_all().await;
    Ok(())
}

/// Providers for the stored credentials, against the default endpoints.
/// `None` where no key is configured.
pub fn providers_for(credentials: &Credentials) -> (Option<WeatherProvider>, Option<NewsProvider>) {
    (
        credentials.weather_key().map(|key| WeatherProvider::new(key.to_owned())),
        credentials.news_key().map(|key| NewsProvider::new(key.to_owned())),
    )
}

/// Probe each provider and report reachability. Unconfigured providers report
/// `false`; no stored reading is touched.
pub async fn test_connections(
    weather: Option<&WeatherProvider>,
    news: Option<&NewsProvider>,
) -> ConnectionReport {
    let weather = match weather {
        Some(provider) => provider.probe().await,
        None => false,
    };
    let news = match news {
        Some(provider) => provider.probe().await,
        None => false,
    };

    ConnectionReport { weather, news }
}
