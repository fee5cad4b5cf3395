use async_trait::async_trait;
use pc_core::{Article, Error, Result};
use serde::Deserialize;

use super::utils;
use super::{FetchRequest, NewsProvider, ProviderMetadata};

#[derive(Debug, Deserialize)]
struct LatestResponse {
    status: String,
    #[serde(default)]
    results: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    link: Option<String>,
    title: Option<String>,
    #[serde(rename = "source_id")]
    source_id: Option<String>,
    pub_date: Option<String>,
    description: Option<String>,
    #[serde(rename = "image_url")]
    image_url: Option<String>,
}

/// newsdata.io `latest` endpoint.
#[derive(Clone)]
pub struct NewsDataProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for NewsDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsDataProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl NewsDataProvider {
    const BASE_URL: &'static str = "https://newsdata.io/api/1";

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
            ("apikey", key.to_string()),
            ("language", request.language.clone()),
        ];
        match (&request.query, &request.category) {
            (Some(q), _) => params.push(("q", q.clone())),
            (None, Some(category)) => params.push(("category", category.clone())),
            (None, None) => {}
        }
        if let Some(country) = &request.country {
            params.push(("country", country.clone()));
        }
        params
    }
}

fn normalize(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter()
        .filter_map(|item| {
            let title = utils::non_empty(item.title)?;
            let url = utils::non_empty(item.link)?;
            let source = utils::non_empty(item.source_id)?;
            let published_at = utils::parse_timestamp(item.pub_date.as_deref()?)?;
            let mut article = Article::new(url, title, source, published_at);
            article.description = utils::non_empty(item.description);
            article.image_url = utils::non_empty(item.image_url);
            Some(article)
        })
        .collect()
}

#[async_trait]
impl NewsProvider for NewsDataProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "newsdata",
            name: "NewsData.io",
            emoji: "📡",
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>> {
        let id = self.metadata().id;
        let key = utils::require_key(id, &self.api_key)?;
        let url = utils::build_url(&self.base_url, "latest", &self.params(key, request))?;

        let response = utils::send(id, self.client.get(url)).await?;
        let body: LatestResponse = response.json().await?;
        if body.status != "success" {
            return Err(Error::Provider(format!("{} answered status {}", id, body.status)));
        }
        Ok(normalize(body.results))
    }
}
