use async_trait::async_trait;
use pc_core::{Article, Error, Result};
use serde::Deserialize;

use super::utils;
use super::{FetchRequest, NewsProvider, ProviderMetadata};

const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    source: RawSource,
    title: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    description: Option<String>,
    url_to_image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// newsapi.org `everything` endpoint. The only provider that can restrict a
/// query to a list of publisher domains.
#[derive(Clone)]
pub struct NewsApiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for NewsApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsApiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NewsApiProvider {
    const BASE_URL: &'static str = "https://newsapi.org/v2";

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
            ("sortBy", "publishedAt".to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
        ];
        if !request.domains.is_empty() {
            params.push(("domains", request.domains.join(",")));
        }
        if let Some(text) = request.search_text() {
            params.push(("q", text.to_string()));
        }
        if let Some(date) = request.date {
            let day = date.format("%Y-%m-%d").to_string();
            params.push(("from", day.clone()));
            params.push(("to", day));
        }
        params
    }
}

fn normalize(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter()
        .filter_map(|item| {
            let title = utils::non_empty(item.title)?;
            let url = utils::non_empty(item.url)?;
            let source = utils::non_empty(item.source.name)?;
            let published_at = utils::parse_timestamp(item.published_at.as_deref()?)?;
            let mut article = Article::new(url, title, source, published_at);
            article.description = utils::non_empty(item.description);
            article.image_url = utils::non_empty(item.url_to_image);
            Some(article)
        })
        .collect()
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "newsapi",
            name: "NewsAPI",
            emoji: "🗞️",
        }
    }

    fn supports_domains(&self) -> bool {
        true
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>> {
        let id = self.metadata().id;
        let key = utils::require_key(id, &self.api_key)?;
        let url = utils::build_url(&self.base_url, "everything", &self.params(key, request))?;

        let response = utils::send(id, self.client.get(url)).await?;
        let body: EverythingResponse = response.json().await?;
        if body.status != "ok" {
            return Err(Error::Provider(format!(
                "{} answered status {}: {}",
                id,
                body.status,
                body.message.unwrap_or_default()
            )));
        }
        Ok(normalize(body.articles))
    }
}
