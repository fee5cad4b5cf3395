use async_trait::async_trait;
use pc_core::{Article, Error, Result};
use serde::Deserialize;

use super::utils;
use super::{FetchRequest, NewsProvider, ProviderMetadata};

const LIMIT: usize = 30;
const FALLBACK_SOURCE: &str = "CurrentsAPI";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    status: String,
    #[serde(default)]
    news: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    url: Option<String>,
    title: Option<String>,
    description: Option<String>,
    author: Option<String>,
    image: Option<String>,
    published: Option<String>,
}

/// currentsapi.services `search` endpoint.
#[derive(Clone)]
pub struct CurrentsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for CurrentsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentsProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CurrentsProvider {
    const BASE_URL: &'static str = "https://api.currentsapi.services/v1";

    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: utils::client(),
            api_key,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn params(&self, key: &str, request: &FetchRequest) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("apiKey", key.to_string()),
            ("language", request.language.clone()),
            ("limit", LIMIT.to_string()),
        ];
        match (&request.query, &request.category) {
            (Some(q), _) => params.push(("keywords", q.clone())),
            (None, Some(category)) => params.push(("category", category.clone())),
            (None, None) => params.push(("keywords", request.default_text.clone())),
        }
        params
    }
}

fn normalize(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter()
        .filter_map(|item| {
            let title = utils::non_empty(item.title)?;
            let url = utils::non_empty(item.url)?;
            let published_at = utils::parse_timestamp(item.published.as_deref()?)?;
            let source = utils::non_empty(item.author).unwrap_or_else(|| FALLBACK_SOURCE.to_string());
            let mut article = Article::new(url, title, source, published_at);
            article.description = utils::non_empty(item.description);
            // the API sends the literal string "None" for missing images
            article.image_url = utils::non_empty(item.image).filter(|i| i != "None");
            Some(article)
        })
        .collect()
}

#[async_trait]
impl NewsProvider for CurrentsProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "currents",
            name: "Currents",
            emoji: "🌊",
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>> {
        let id = self.metadata().id;
        let key = utils::require_key(id, &self.api_key)?;
        let url = utils::build_url(&self.base_url, "search", &self.params(key, request))?;

        let response = utils::send(id, self.client.get(url)).await?;
        let body: SearchResponse = response.json().await?;
        if body.status != "ok" {
            return Err(Error::Provider(format!("{} answered status {}", id, body.status)));
        }
        Ok(normalize(body.news))
    }
}
