use async_trait::async_trait;
use pc_core::{Article, Result};
use serde::Deserialize;

use super::utils;
use super::{FetchRequest, NewsProvider, ProviderMetadata};

const NUMBER: usize = 15;
const DESCRIPTION_CHARS: usize = 200;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<RawArticle>,
}

#[derive(Debug, Deserialize)]
struct RawArticle {
    url: Option<String>,
    title: Option<String>,
    text: Option<String>,
    image: Option<String>,
    publish_date: Option<String>,
    source_country: Option<String>,
}

/// worldnewsapi.com `search-news` endpoint. It reports no publisher, only the
/// source country.
#[derive(Clone)]
pub struct WorldNewsProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl std::fmt::Debug for WorldNewsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorldNewsProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl WorldNewsProvider {
    const BASE_URL: &'static str = "https://api.worldnewsapi.com";

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
        let text = request
            .query
            .clone()
            .or_else(|| request.category.clone())
            .unwrap_or_else(|| request.default_text.clone());
        let mut params = vec![
            ("api-key", key.to_string()),
            ("language", request.language.clone()),
            ("number", NUMBER.to_string()),
            ("text", text),
        ];
        if !request.source_countries.is_empty() {
            params.push(("source-countries", request.source_countries.join(",")));
        }
        params
    }
}

fn excerpt(text: &str) -> String {
    let cut: String = text.chars().take(DESCRIPTION_CHARS).collect();
    format!("{}...", cut)
}

fn normalize(raw: Vec<RawArticle>) -> Vec<Article> {
    raw.into_iter()
        .filter_map(|item| {
            let title = utils::non_empty(item.title)?;
            let url = utils::non_empty(item.url)?;
            let published_at = utils::parse_timestamp(item.publish_date.as_deref()?)?;
            let country = item
                .source_country
                .map(|c| c.to_uppercase())
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| "WORLD".to_string());
            let mut article = Article::new(url, title, format!("{} Source", country), published_at);
            article.description = utils::non_empty(item.text).map(|t| excerpt(&t));
            article.image_url = utils::non_empty(item.image);
            Some(article)
        })
        .collect()
}

#[async_trait]
impl NewsProvider for WorldNewsProvider {
    fn metadata(&self) -> ProviderMetadata {
        ProviderMetadata {
            id: "worldnews",
            name: "WorldNewsAPI",
            emoji: "🌍",
        }
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>> {
        let id = self.metadata().id;
        let key = utils::require_key(id, &self.api_key)?;
        let url = utils::build_url(&self.base_url, "search-news", &self.params(key, request))?;

        let response = utils::send(id, self.client.get(url)).await?;
        let body: SearchResponse = response.json().await?;
        Ok(normalize(body.news))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_source_countries_and_excerpt() {
        let long_text = "a".repeat(450);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search-news"))
            .and(query_param("source-countries", "cl,ar"))
            .and(query_param("text", "noticias"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "offset": 0,
                "number": 15,
                "available": 1,
                "news": [{
                    "id": 1,
                    "title": "Paro de camioneros",
                    "text": long_text,
                    "url": "https://www.clarin.com/paro",
                    "image": null,
                    "publish_date": "2024-05-10 11:00:00",
                    "source_country": "ar"
                }]
            })))
            .mount(&server)
            .await;

        let provider = WorldNewsProvider::new(Some("k".into())).with_base_url(server.uri());
        let request = FetchRequest {
            language: "es".into(),
            source_countries: vec!["cl".into(), "ar".into()],
            default_text: "noticias".into(),
            ..Default::default()
        };
        let articles = provider.fetch(&request).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].source, "AR Source");
        let description = articles[0].description.as_deref().unwrap();
        assert_eq!(description.chars().count(), DESCRIPTION_CHARS + 3);
        assert!(description.ends_with("..."));
    }

    #[tokio::test]
    async fn test_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let provider = WorldNewsProvider::new(Some("k".into())).with_base_url(server.uri());
        let err = provider.fetch(&FetchRequest::default()).await.unwrap_err();
        assert!(matches!(err, pc_core::Error::RateLimited(_)));
    }
}
