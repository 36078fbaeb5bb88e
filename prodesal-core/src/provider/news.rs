use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::FetchError;
use crate::model::NewsArticle;

use super::{Probe, truncate_body};

/// Chilean outlets queried for agricultural coverage.
pub const SOURCES: [&str; 4] =
    ["elmostrador.cl", "biobiochile.cl", "cooperativa.cl", "lanacion.cl"];

/// Combined batch is capped at this many articles.
pub const MAX_ARTICLES: usize = 10;

const PAGE_SIZE: &str = "5";
const DEFAULT_BASE_URL: &str = "https://newsapi.org/v2";

/// Substring matches over the case-folded title+description decide relevance.
/// Deliberately naive (no tokenization); this mirrors how the dashboard has
/// always filtered.
const KEYWORDS: [&str; 26] = [
    "agricultura",
    "ganadería",
    "campo",
    "agricultor",
    "ganadero",
    "producción",
    "cultivo",
    "ganado",
    "veterinario",
    "pecuario",
    "rural",
    "indap",
    "sag",
    "chile",
    "chiloé",
    "castro",
    "fertilizante",
    "semilla",
    "cosecha",
    "planta",
    "animal",
    "veterinaria",
    "pecuaria",
    "agrícola",
    "agri",
    "ganaderia",
];

/// Pulls recent articles from the fixed source list and keeps the
/// agriculture-relevant subset.
#[derive(Debug, Clone)]
pub struct NewsProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl NewsProvider {
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

    /// Query every source, absorb per-source failures, filter to agricultural
    /// coverage and cap the combined batch.
    ///
    /// Only when no source at all produced articles does the batch fail, so
    /// the caller can substitute the mock list instead of showing nothing.
    pub async fn agricultural_news(&self) -> Result<Vec<NewsArticle>, FetchError> {
        let mut combined = Vec::new();
        let mut last_err = None;
        let mut any_ok = false;

        for source in SOURCES {
            match self.fetch_source(source).await {
                Ok(mut articles) => {
                    any_ok = true;
                    combined.append(&mut articles);
                }
                Err(err) => {
                    tracing::warn!(source, error = %err, "news source failed, skipping");
                    last_err = Some(err);
                }
            }
        }

        if !any_ok {
            // Unreachable only if SOURCES were empty.
            return Err(last_err.unwrap_or(FetchError::CredentialMissing("news")));
        }

        combined.retain(|article| {
            is_agricultural(&article.title, article.description.as_deref().unwrap_or_default())
        });
        combined.truncate(MAX_ARTICLES);

        Ok(combined)
    }

    async fn fetch_source(&self, source: &str) -> Result<Vec<NewsArticle>, FetchError> {
        let url = format!("{}/everything", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[
                ("sources", source),
                ("apiKey", self.api_key.as_str()),
                ("language", "es"),
                ("pageSize", PAGE_SIZE),
            ])
            .send()
            .await
            .map_err(|source| FetchError::Http { service: "NewsAPI", source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| FetchError::Http { service: "NewsAPI", source })?;

        if !status.is_success() {
            return Err(FetchError::Status {
                service: "NewsAPI",
                status,
                body: truncate_body(&body),
            });
        }

        let parsed: NaResponse = serde_json::from_str(&body)
            .map_err(|source| FetchError::Malformed { service: "NewsAPI", source })?;

        Ok(parsed.articles.into_iter().map(NaArticle::into_article).collect())
    }
}

/// Static headlines served when no key is configured or every source fails.
pub fn fallback_articles() -> Vec<NewsArticle> {
    let now = Utc::now();

    vec![
        NewsArticle {
            title: "INDAP fortalece apoyo a pequeños agricultores de Chiloé".to_string(),
            description: Some(
                "El Instituto de Desarrollo Agropecuario amplía programas de apoyo técnico y \
                 financiamiento para productores de la isla."
                    .to_string(),
            ),
            published_at: now,
            url: "#".to_string(),
            image_url: None,
        },
        NewsArticle {
            title: "SAG implementa nuevas medidas fitosanitarias en Los Lagos".to_string(),
            description: Some(
                "El Servicio Agrícola y Ganadero refuerza protocolos de control de plagas y \
                 enfermedades vegetales."
                    .to_string(),
            ),
            published_at: now - chrono::Duration::days(1),
            url: "#".to_string(),
            image_url: None,
        },
        NewsArticle {
            title: "Cooperativas agrícolas de Chiloé aumentan producción 15%".to_string(),
            description: Some(
                "Las cooperativas rurales de la isla reportan incrementos significativos en \
                 producción de papa y ganadería."
                    .to_string(),
            ),
            published_at: now - chrono::Duration::days(2),
            url: "#".to_string(),
            image_url: None,
        },
    ]
}

fn is_agricultural(title: &str, description: &str) -> bool {
    let text = format!("{title} {description}").to_lowercase();
    KEYWORDS.iter().any(|keyword| text.contains(keyword))
}

#[derive(Debug, Deserialize)]
struct NaResponse {
    #[serde(default)]
    articles: Vec<NaArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NaArticle {
    title: String,
    description: Option<String>,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    url: String,
    url_to_image: Option<String>,
}

impl NaArticle {
    fn into_article(self) -> NewsArticle {
        NewsArticle {
            title: self.title,
            description: self.description,
            published_at: self.published_at.unwrap_or_else(Utc::now),
            url: self.url,
            image_url: self.url_to_image,
        }
    }
}

#[async_trait]
impl Probe for NewsProvider {
    async fn probe(&self) -> bool {
        let url = format!("{}/top-headlines", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&[("country", "cl"), ("apiKey", self.api_key.as_str())])
            .send()
            .await;

        match res {
            Ok(res) => res.status().is_success(),
            Err(err) => {
                tracing::debug!(error = %err, "news probe failed");
                false
            }
        }
    }
}
