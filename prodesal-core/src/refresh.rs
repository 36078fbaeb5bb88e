//! Refresh and fallback orchestration.
//!
//! Each feed owns a single "latest" slot: the value shown on the dashboard,
//! a monotonic sequence number guarding against stale completions, and the
//! feed's place in the state machine
//! `Unconfigured → FallbackActive → LiveActive ⇄ LiveDegraded`.
//! Every failure path lands on a displayable value: the static fallback while
//! a feed has never fetched successfully, the last-known-good reading once it
//! has.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::config::{Config, CredentialUpdate, Credentials};
use crate::error::FetchError;
use crate::market;
use crate::model::{MarketEntry, NewsArticle, Notice, StationReading, WeatherReading};
use crate::monitor;
use crate::provider::{Feed, NewsProvider, WeatherProvider, news, weather};

pub const WEATHER_REFRESH_INTERVAL: Duration = Duration::from_secs(30 * 60);
pub const NEWS_REFRESH_INTERVAL: Duration = Duration::from_secs(2 * 60 * 60);

/// Where a feed currently sits between "never configured" and "live but the
/// last scheduled fetch failed".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    Unconfigured,
    FallbackActive,
    LiveActive,
    LiveDegraded,
}

/// The single latest value for one feed.
#[derive(Debug)]
struct Slot<T> {
    value: T,
    seq: u64,
    state: FeedState,
}

impl<T> Slot<T> {
    fn new(value: T) -> Self {
        Self { value, seq: 0, state: FeedState::Unconfigured }
    }

    /// Last-write-wins keyed by sequence number: a completion older than what
    /// the slot already holds is discarded.
    fn record_success(&mut self, seq: u64, value: T) -> bool {
        if seq < self.seq {
            return false;
        }
        self.seq = seq;
        self.value = value;
        self.state = FeedState::LiveActive;
        true
    }

    /// A failed cycle degrades a live feed but keeps its last-known-good
    /// value; a feed that never went live (re)gains the static fallback.
    fn record_failure(&mut self, seq: u64, fallback: impl FnOnce() -> T) {
        if seq < self.seq {
            return;
        }
        self.seq = seq;
        match self.state {
            FeedState::LiveActive | FeedState::LiveDegraded => {
                self.state = FeedState::LiveDegraded;
            }
            FeedState::Unconfigured | FeedState::FallbackActive => {
                self.value = fallback();
                self.state = FeedState::FallbackActive;
            }
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Shared dashboard context: credentials, the latest reading per feed and the
/// notice channel towards the presentation layer.
///
/// Station readings and market prices are pure derivations over this state,
/// so they are recomputed on every read instead of being stored.
#[derive(Debug)]
pub struct Dashboard {
    config: Mutex<Config>,
    weather: Mutex<Slot<WeatherReading>>,
    news: Mutex<Slot<Vec<NewsArticle>>>,
    weather_seq: AtomicU64,
    news_seq: AtomicU64,
    online: AtomicBool,
    weather_loop_armed: AtomicBool,
    news_loop_armed: AtomicBool,
    notices: mpsc::UnboundedSender<Notice>,
    weather_base_url: Option<String>,
    news_base_url: Option<String>,
    /// Handle to ourselves so refresh loops can be spawned from `&self`.
    me: Weak<Dashboard>,
}

impl Dashboard {
    pub fn new(config: Config) -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        Self::with_endpoints(config, None, None)
    }

    /// Like [`Dashboard::new`] but with provider endpoints overridden
    /// (test servers).
    pub fn with_endpoints(
        config: Config,
        weather_base_url: Option<String>,
        news_base_url: Option<String>,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let dashboard = Arc::new_cyclic(|me| Self {
            config: Mutex::new(config),
            weather: Mutex::new(Slot::new(weather::fallback_reading())),
            news: Mutex::new(Slot::new(news::fallback_articles())),
            weather_seq: AtomicU64::new(0),
            news_seq: AtomicU64::new(0),
            online: AtomicBool::new(true),
            weather_loop_armed: AtomicBool::new(false),
            news_loop_armed: AtomicBool::new(false),
            notices: tx,
            weather_base_url,
            news_base_url,
            me: me.clone(),
        });

        (dashboard, rx)
    }

    pub fn latest_weather(&self) -> WeatherReading {
        lock(&self.weather).value.clone()
    }

    pub fn latest_news(&self) -> Vec<NewsArticle> {
        lock(&self.news).value.clone()
    }

    pub fn weather_state(&self) -> FeedState {
        lock(&self.weather).state
    }

    pub fn news_state(&self) -> FeedState {
        lock(&self.news).state
    }

    /// Station cards, derived from whatever the weather slot holds right now.
    pub fn station_readings(&self) -> Vec<StationReading> {
        monitor::station_readings(Some(&lock(&self.weather).value))
    }

    pub fn market_prices(&self) -> Vec<MarketEntry> {
        market::market_prices()
    }

    pub fn credentials(&self) -> Credentials {
        lock(&self.config).credentials.clone()
    }

    pub fn config_snapshot(&self) -> Config {
        lock(&self.config).clone()
    }

    /// Apply an administration-form update in memory. Persistence and the
    /// follow-up reload are the caller's job (see [`crate::admin`]).
    pub fn store_credentials(&self, update: CredentialUpdate) {
        lock(&self.config).apply_update(update);
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    /// Record a connectivity transition. Coming back online triggers an
    /// immediate full refresh; going offline cancels nothing in flight.
    pub async fn set_online(&self, online: bool) {
        let was_online = self.online.swap(online, Ordering::SeqCst);
        if online && !was_online {
            self.refresh_all().await;
        }
    }

    /// Manual "refresh all": a no-op with an informational notice while
    /// offline. Station and market data need no fetch; they are derived on
    /// every read.
    pub async fn refresh_all(&self) {
        if !self.is_online() {
            self.push_notice(Notice::info("Sin conexión. No es posible actualizar los datos."));
            return;
        }

        self.push_notice(Notice::info("Actualizando datos...").lasting(Duration::from_secs(2)));
        self.refresh_weather().await;
        self.refresh_news().await;
    }

    /// One weather refresh cycle. Always leaves a displayable reading in the
    /// slot and returns it.
    pub async fn refresh_weather(&self) -> WeatherReading {
        let seq = self.weather_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(key) = self.credentials().weather_key().map(str::to_owned) else {
            tracing::info!(
                feed = %Feed::Weather,
                error = %FetchError::CredentialMissing("weather"),
                "serving fallback weather"
            );
            self.push_notice(setup_notice(Feed::Weather));
            lock(&self.weather).record_failure(seq, weather::fallback_reading);
            return self.latest_weather();
        };

        let mut provider = WeatherProvider::new(key);
        if let Some(base) = &self.weather_base_url {
            provider = provider.with_base_url(base.clone());
        }

        match provider.current().await {
            Ok(reading) => {
                if lock(&self.weather).record_success(seq, reading) {
                    self.arm_weather_loop();
                }
            }
            Err(err) => {
                tracing::warn!(feed = %Feed::Weather, error = %err, "weather fetch failed");
                lock(&self.weather).record_failure(seq, weather::fallback_reading);
            }
        }

        self.latest_weather()
    }

    /// One news refresh cycle; same contract as [`Dashboard::refresh_weather`].
    pub async fn refresh_news(&self) -> Vec<NewsArticle> {
        let seq = self.news_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let Some(key) = self.credentials().news_key().map(str::to_owned) else {
            tracing::info!(
                feed = %Feed::News,
                error = %FetchError::CredentialMissing("news"),
                "serving fallback news"
            );
            self.push_notice(setup_notice(Feed::News));
            lock(&self.news).record_failure(seq, news::fallback_articles);
            return self.latest_news();
        };

        let mut provider = NewsProvider::new(key);
        if let Some(base) = &self.news_base_url {
            provider = provider.with_base_url(base.clone());
        }

        match provider.agricultural_news().await {
            Ok(articles) => {
                if lock(&self.news).record_success(seq, articles) {
                    self.arm_news_loop();
                }
            }
            Err(err) => {
                tracing::warn!(feed = %Feed::News, error = %err, "news batch failed");
                lock(&self.news).record_failure(seq, news::fallback_articles);
            }
        }

        self.latest_news()
    }

    pub(crate) fn push_notice(&self, notice: Notice) {
        // Nobody listening is fine; notices are best-effort.
        let _ = self.notices.send(notice);
    }

    /// Armed once, on the first successful live fetch, and never torn down;
    /// a cycle that fails after the timer exists degrades the slot instead of
    /// stopping the schedule.
    fn arm_weather_loop(&self) {
        if self.weather_loop_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(dashboard) = self.me.upgrade() else { return };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(WEATHER_REFRESH_INTERVAL);
            // First tick completes immediately; the fetch that armed us covers it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                dashboard.refresh_weather().await;
            }
        });
    }

    fn arm_news_loop(&self) {
        if self.news_loop_armed.swap(true, Ordering::SeqCst) {
            return;
        }

        let Some(dashboard) = self.me.upgrade() else { return };
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(NEWS_REFRESH_INTERVAL);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                dashboard.refresh_news().await;
            }
        });
    }
}

fn setup_notice(feed: Feed) -> Notice {
    Notice::warning(format!(
        "Configura una API key de {} en el panel de administración para obtener datos reales.",
        feed.display_name()
    ))
    .lasting(Duration::from_secs(10))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Severity;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_with(weather: Option<&str>, news_key: Option<&str>) -> Config {
        let mut config = Config::default();
        config.credentials.weather = weather.map(str::to_owned);
        config.credentials.news = news_key.map(str::to_owned);
        config
    }

    fn castro_weather_json() -> serde_json::Value {
        json!({
            "name": "Castro",
            "main": { "temp": 12.0, "humidity": 90, "pressure": 1010 },
            "weather": [{ "description": "light rain", "icon": "10d" }],
            "wind": { "speed": 5.0 }
        })
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<Notice>) -> Vec<Notice> {
        let mut notices = Vec::new();
        while let Ok(notice) = rx.try_recv() {
            notices.push(notice);
        }
        notices
    }

    #[test]
    fn slot_discards_stale_completions() {
        let mut slot = Slot::new(0u32);

        assert!(slot.record_success(2, 20));
        assert!(!slot.record_success(1, 10));
        assert_eq!(slot.value, 20);

        slot.record_failure(1, || 99);
        assert_eq!(slot.value, 20);
        assert_eq!(slot.state, FeedState::LiveActive);
    }

    #[test]
    fn slot_failure_degrades_live_but_keeps_value() {
        let mut slot = Slot::new(0u32);

        slot.record_failure(1, || 7);
        assert_eq!(slot.state, FeedState::FallbackActive);
        assert_eq!(slot.value, 7);

        assert!(slot.record_success(2, 20));
        slot.record_failure(3, || 7);
        assert_eq!(slot.state, FeedState::LiveDegraded);
        assert_eq!(slot.value, 20);

        assert!(slot.record_success(4, 30));
        assert_eq!(slot.state, FeedState::LiveActive);
    }

    #[tokio::test]
    async fn unconfigured_serves_fallbacks_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (dashboard, mut rx) = Dashboard::with_endpoints(
            config_with(None, None),
            Some(server.uri()),
            Some(server.uri()),
        );
        dashboard.refresh_all().await;

        let weather = dashboard.latest_weather();
        assert_eq!(weather.temperature_c, 18);
        assert_eq!(weather.condition, "Lluvia ligera");
        assert_eq!(dashboard.weather_state(), FeedState::FallbackActive);

        let articles = dashboard.latest_news();
        assert_eq!(articles.len(), 3);
        assert!(
            articles[0].title.contains("INDAP fortalece apoyo a pequeños agricultores de Chiloé")
        );
        assert_eq!(dashboard.news_state(), FeedState::FallbackActive);

        let stations = dashboard.station_readings();
        assert_eq!(stations.len(), 3);
        assert!(stations.iter().all(|s| s.temperature_c == 18 && s.humidity_pct == 85));

        assert_eq!(dashboard.market_prices().len(), 4);

        let notices = drain(&mut rx);
        let warnings = notices.iter().filter(|n| n.severity == Severity::Warning).count();
        assert_eq!(warnings, 2, "one setup notice per unconfigured feed");

        server.verify().await;
    }

    #[tokio::test]
    async fn live_weather_reaches_live_active_and_feeds_stations() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(castro_weather_json()))
            .mount(&server)
            .await;

        let (dashboard, _rx) =
            Dashboard::with_endpoints(config_with(Some("KEY"), None), Some(server.uri()), None);
        let reading = dashboard.refresh_weather().await;

        assert_eq!(reading.temperature_c, 12);
        assert_eq!(reading.wind_speed_kmh, 18);
        assert_eq!(reading.visibility_km, 10);
        assert_eq!(dashboard.weather_state(), FeedState::LiveActive);

        // Disease-risk cards must reflect the live reading, not the fallback.
        let stations = dashboard.station_readings();
        assert!(stations.iter().all(|s| s.temperature_c == 12 && s.humidity_pct == 90));
    }

    #[tokio::test]
    async fn failed_repeat_degrades_but_serves_last_known_good() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(castro_weather_json()))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (dashboard, _rx) =
            Dashboard::with_endpoints(config_with(Some("KEY"), None), Some(server.uri()), None);

        dashboard.refresh_weather().await;
        assert_eq!(dashboard.weather_state(), FeedState::LiveActive);

        let reading = dashboard.refresh_weather().await;
        assert_eq!(dashboard.weather_state(), FeedState::LiveDegraded);
        assert_eq!(reading.temperature_c, 12, "last-known-good, not the static fallback");

        dashboard.refresh_weather().await;
        assert_eq!(dashboard.weather_state(), FeedState::LiveDegraded);
    }

    #[tokio::test]
    async fn cleared_credential_fails_closed_into_degraded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(castro_weather_json()))
            .mount(&server)
            .await;

        let (dashboard, _rx) =
            Dashboard::with_endpoints(config_with(Some("KEY"), None), Some(server.uri()), None);
        dashboard.refresh_weather().await;
        assert_eq!(dashboard.weather_state(), FeedState::LiveActive);

        lock(&dashboard.config).credentials.weather = None;
        let reading = dashboard.refresh_weather().await;

        assert_eq!(dashboard.weather_state(), FeedState::LiveDegraded);
        assert_eq!(reading.temperature_c, 12);
    }

    #[tokio::test]
    async fn offline_refresh_is_a_noop_with_notice() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (dashboard, mut rx) = Dashboard::with_endpoints(
            config_with(Some("KEY"), Some("KEY")),
            Some(server.uri()),
            Some(server.uri()),
        );
        dashboard.set_online(false).await;
        dashboard.refresh_all().await;

        assert_eq!(dashboard.weather_state(), FeedState::Unconfigured);
        let notices = drain(&mut rx);
        assert!(notices.iter().any(|n| n.message.contains("Sin conexión")));

        server.verify().await;
    }

    #[tokio::test]
    async fn coming_back_online_triggers_full_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/weather"))
            .respond_with(ResponseTemplate::new(200).set_body_json(castro_weather_json()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ok",
                "articles": [{
                    "title": "Cosecha récord en Chiloé",
                    "description": "",
                    "publishedAt": "2025-06-01T12:00:00Z",
                    "url": "https://example.cl/nota"
                }]
            })))
            .mount(&server)
            .await;

        let (dashboard, _rx) = Dashboard::with_endpoints(
            config_with(Some("KEY"), Some("KEY")),
            Some(server.uri()),
            Some(server.uri()),
        );
        dashboard.set_online(false).await;
        dashboard.set_online(true).await;

        assert_eq!(dashboard.weather_state(), FeedState::LiveActive);
        assert_eq!(dashboard.news_state(), FeedState::LiveActive);
        // The same stub answers all four sources, so the batch holds four copies.
        assert_eq!(dashboard.latest_news().len(), 4);
    }

    #[tokio::test]
    async fn news_batch_failure_before_going_live_serves_mock_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let (dashboard, _rx) =
            Dashboard::with_endpoints(config_with(None, Some("BAD")), None, Some(server.uri()));
        let articles = dashboard.refresh_news().await;

        assert_eq!(articles.len(), 3, "mock list, never an empty batch");
        assert_eq!(dashboard.news_state(), FeedState::FallbackActive);
    }
}
