use async_trait::async_trait;
use pc_core::{Article, Result};
use serde::Deserialize;

use super::utils;
use super::{FetchRequest, NewsProvider, ProviderMetadata};

const MAX_RESULTS: usize = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawArticle {
    url: Option<String>,
    title: Option<String>,
    source: Option<RawSource>,
    published_at: Option<String>,
    description: Option<String>,
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    name: Option<String>,
}

/// gnews.io `search` endpoint.
#[derive(Clone)]
pub struct GNewsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for GNewsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GNewsProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GNewsProvider {
    const BASE_URL: &'static str = "https://gnews.io/api/v4";

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
        // search requires q
        let q = request
            .query
            .clone()
            .or_else(|| request.category.clone())
            .unwrap_or_else(|| "general".to_string());
        let mut params = vec![
            ("token", key.to_string()),
            ("lang", request.language.clone()),
            ("max", MAX_RESULTS.to_string()),
            ("sortby", "publishedAt".to_string()),
            ("q", q),
        ];
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
            let url = utils::non_empty(item.url)?;
            let source = utils::non_empty(item.source.and_then(|s| s.name))?;
            let published_at = utils::parse_timestamp(item.published_at.as_deref()?)?;
            let mut article = Article::new(url, title, source, published_at);
            article.description = utils::non_empty(item.description);
            article.image_url = utils::non_empty(item.image);
            Some(article)
        })
        .collect()
}

#[async_trait]
impl NewsProvider for GNewsProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "gnews",
            name: "GNews",
            emoji: "🌐",
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>> {
        let id = self.metadata().id;
        let key = utils::require_key(id, &self.api_key)?;
        let url = utils::build_url(&self.base_url, "search", &self.params(key, request))?;

        let response = utils::send(id, self.client.get(url)).await?;
        let body: SearchResponse = response.json().await?;
        Ok(normalize(body.articles))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_query_falls_back_to_general() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "general"))
            .and(query_param("lang", "en"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "totalArticles": 1,
                "articles": [{
                    "title": "Storm hits coast",
                    "description": "Heavy rain",
                    "url": "https://www.reuters.com/world/storm",
                    "image": "https://www.reuters.com/storm.jpg",
                    "publishedAt": "2024-05-10T09:00:00Z",
                    "source": {"name": "Reuters", "url": "https://www.reuters.com"}
                }]
            })))
            .mount(&server)
            .await;

        let provider = GNewsProvider::new(Some("k".into())).with_base_url(server.uri());
        let request = FetchRequest {
            language: "en".into(),
            ..Default::default()
        };
        let articles = provider.fetch(&request).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "Reuters");
        assert_eq!(articles[0].description.as_deref(), Some("Heavy rain"));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = GNewsProvider::new(Some("k".into())).with_base_url(server.uri());
        let err = provider.fetch(&FetchRequest::default()).await.unwrap_err();
        assert!(matches!(err, pc_core::Error::RateLimited(ref id) if id == "gnews"));
    }
}
