use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use pc_core::{Article, Result, ScopeProfile};

pub mod currents;
pub mod gnews;
pub mod newsapi;
pub mod newsdata;
pub mod worldnews;

pub use currents::CurrentsProvider;
pub use gnews::GNewsProvider;
pub use newsapi::NewsApiProvider;
pub use newsdata::NewsDataProvider;
pub use worldnews::WorldNewsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub emoji: &'static str,
}

/// What a single provider call should ask for.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub language: String,
    pub country: Option<String>,
    pub source_countries: Vec<String>,
    pub default_text: String,
    /// Publisher domains to restrict to. Empty means unrestricted.
    pub domains: Vec<String>,
    pub query: Option<String>,
    pub category: Option<String>,
    /// Keyword expansion of `category` for providers without a category filter
    pub category_query: Option<String>,
    pub date: Option<NaiveDate>,
}

impl FetchRequest {
    pub fn for_scope(profile: &ScopeProfile) -> Self {
        Self {
            language: profile.language.clone(),
            country: profile.country.clone(),
            source_countries: profile.source_countries.clone(),
            default_text: profile.default_text.clone(),
            ..Default::default()
        }
    }

    pub fn with_domains(mut self, domains: Vec<String>) -> Self {
        self.domains = domains;
        self
    }

    /// Free text first, then the category keywords.
    pub fn search_text(&self) -> Option<&str> {
        self.query
            .as_deref()
            .or(self.category_query.as_deref())
            .filter(|q| !q.trim().is_empty())
    }
}

#[async_trait]
pub trait NewsProvider: Send + Sync {
    fn metadata(&self) -> ProviderMetadata;

    /// Whether the provider honours `FetchRequest::domains`
    fn supports_domains(&self) -> bool {
        false
    }

    /// Shorthand names accepted on the command line and in `provider=`
    fn cli_names(&self) -> Vec<&str> {
        vec![self.metadata().id]
    }

    /// Fetch one batch of normalized articles.
    ///
    /// A missing key yields `Error::NotConfigured`, HTTP 429 yields
    /// `Error::RateLimited`. Other failures surface as `Error::Provider`.
    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>>;
}

/// Credentials for every provider, any of which may be missing.
#[derive(Debug, Clone, Default)]
pub struct ProviderKeys {
    pub newsapi: Option<String>,
    pub newsdata: Option<String>,
    pub gnews: Option<String>,
    pub worldnews: Option<String>,
    pub currents: Option<String>,
}

/// All providers in fallback priority order.
pub fn default_providers(keys: &ProviderKeys) -> Vec<Arc<dyn NewsProvider>> {
    vec![
        Arc::new(NewsApiProvider::new(keys.newsapi.clone())),
        Arc::new(NewsDataProvider::new(keys.newsdata.clone())),
        Arc::new(GNewsProvider::new(keys.gnews.clone())),
        Arc::new(WorldNewsProvider::new(keys.worldnews.clone())),
        Arc::new(CurrentsProvider::new(keys.currents.clone())),
    ]
}

/// Common utilities for providers
pub(crate) mod utils {
    use std::time::Duration;

    use chrono::{DateTime, NaiveDateTime, Utc};
    use pc_core::{Error, Result};
    use reqwest::{Response, StatusCode};
    use url::Url;

    pub fn client() -> reqwest::Client {
        reqwest::Client::builder()
            .user_agent(concat!("puntociego/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default()
    }

    pub fn require_key<'a>(id: &str, key: &'a Option<String>) -> Result<&'a str> {
        key.as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::NotConfigured(id.to_string()))
    }

    pub fn build_url(base: &str, path: &str, params: &[(&str, String)]) -> Result<Url> {
        let joined = format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'));
        Url::parse_with_params(&joined, params)
            .map_err(|e| Error::Config(format!("Invalid provider URL {}: {}", joined, e)))
    }

    pub async fn send(id: &str, request: reqwest::RequestBuilder) -> Result<Response> {
        let response = request.send().await?;
        match response.status() {
            StatusCode::TOO_MANY_REQUESTS => Err(Error::RateLimited(id.to_string())),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::Provider(format!(
                    "{} returned {}: {}",
                    id,
                    status,
                    body.chars().take(200).collect::<String>()
                )))
            }
            _ => Ok(response),
        }
    }

    /// Providers disagree on timestamp formats; accept the ones seen in the wild.
    pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        if let Ok(parsed) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S %z") {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn non_empty(value: Option<String>) -> Option<String> {
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

}
