use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use inquire::{Password, PasswordDisplayMode};
use tokio::sync::mpsc::UnboundedReceiver;

use prodesal_core::{
    Config, CredentialUpdate, Dashboard, FeedState, Notice, Severity, admin,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "prodesal", version, about = "Panel de datos PRODESAL de Castro")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Refresh every feed once and render the dashboard.
    Show,

    /// Keep the dashboard running on the provider refresh schedules.
    Watch,

    /// Configure the API keys interactively.
    Configure,

    /// Probe the configured providers and report reachability.
    Test,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Show => show().await,
            Command::Watch => watch().await,
            Command::Configure => configure().await,
            Command::Test => test_connections().await,
        }
    }
}

async fn show() -> Result<()> {
    let config = Config::load()?;
    let (dashboard, mut notices) = Dashboard::new(config);

    dashboard.refresh_all().await;

    print_pending_notices(&mut notices);
    render(&dashboard);
    Ok(())
}

async fn watch() -> Result<()> {
    let config = Config::load()?;
    let (dashboard, mut notices) = Dashboard::new(config);

    dashboard.refresh_all().await;
    render(&dashboard);

    // Scheduled cycles keep running; surface their notices until Ctrl-C.
    tokio::spawn(async move {
        while let Some(notice) = notices.recv().await {
            print_notice(&notice);
        }
    });

    println!("\nActualización automática activa. Ctrl-C para salir.");
    tokio::signal::ctrl_c().await?;
    Ok(())
}

async fn configure() -> Result<()> {
    println!("Panel de administración: deja un campo vacío para no modificarlo.\n");

    let weather = prompt_key("API key de OpenWeather (Clima):")?;
    let news = prompt_key("API key de NewsAPI (Noticias):")?;
    let custom = prompt_key("API key personalizada:")?;

    let config = Config::load()?;
    let (dashboard, mut notices) = Dashboard::new(config);

    admin::save_credentials(&dashboard, CredentialUpdate { weather, news, custom }).await?;

    print_pending_notices(&mut notices);
    render(&dashboard);
    Ok(())
}

async fn test_connections() -> Result<()> {
    let config = Config::load()?;
    let (weather, news) = admin::providers_for(&config.credentials);
    let report = admin::test_connections(weather.as_ref(), news.as_ref()).await;

    println!("Resultados de pruebas:");
    println!("  Clima (OpenWeather): {}", if report.weather { "funcionando" } else { "error" });
    println!("  Noticias (NewsAPI):  {}", if report.news { "funcionando" } else { "error" });
    Ok(())
}

fn prompt_key(label: &str) -> Result<Option<String>> {
    let key = Password::new(label)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()?;

    Ok(Some(key))
}

fn render(dashboard: &Dashboard) {
    let weather = dashboard.latest_weather();

    println!();
    println!("=== Clima — {} ({}) ===", weather.location, state_label(dashboard.weather_state()));
    println!("  {}°C  {}", weather.temperature_c, weather.condition);
    println!(
        "  Humedad: {}%  Viento: {} km/h  Presión: {} hPa  Visibilidad: {} km",
        weather.humidity_pct, weather.wind_speed_kmh, weather.pressure_hpa, weather.visibility_km
    );
    println!("  Última actualización: {}", weather.captured_at.format("%H:%M"));

    println!();
    println!("=== Monitoreo de tizón tardío ===");
    for station in dashboard.station_readings() {
        println!(
            "  {} ({}) — {} / riesgo {} — {}°C, {}%",
            station.station,
            station.location,
            station.status.label(),
            station.risk.label(),
            station.temperature_c,
            station.humidity_pct
        );
    }

    println!();
    println!("=== Precios de mercado ===");
    for entry in dashboard.market_prices() {
        println!("  {} ${}/{} {}", entry.product, entry.price, entry.unit, entry.trend.arrow());
    }

    println!();
    println!("=== Noticias agrícolas ({}) ===", state_label(dashboard.news_state()));
    for article in dashboard.latest_news() {
        println!("  [{}] {}", relative_date(article.published_at), article.title);
        if let Some(description) = &article.description {
            println!("      {description}");
        }
    }
}

fn state_label(state: FeedState) -> &'static str {
    match state {
        FeedState::Unconfigured => "sin configurar",
        FeedState::FallbackActive => "datos de ejemplo",
        FeedState::LiveActive => "en vivo",
        FeedState::LiveDegraded => "en vivo, sin actualizar",
    }
}

/// Compact age label used next to each headline: "Ahora", "3h", "2d".
fn relative_date(published: DateTime<Utc>) -> String {
    let hours = (Utc::now() - published).num_hours();

    if hours < 1 {
        "Ahora".to_string()
    } else if hours < 24 {
        format!("{hours}h")
    } else {
        format!("{}d", hours / 24)
    }
}

fn print_pending_notices(notices: &mut UnboundedReceiver<Notice>) {
    while let Ok(notice) = notices.try_recv() {
        print_notice(&notice);
    }
}

fn print_notice(notice: &Notice) {
    let tag = match notice.severity {
        Severity::Info => "info",
        Severity::Success => "ok",
        Severity::Warning => "aviso",
        Severity::Error => "error",
    };
    println!("[{tag}] {}", notice.message);
}
