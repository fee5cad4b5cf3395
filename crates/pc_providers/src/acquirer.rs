use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use futures::future::{join, join_all};
use pc_core::{normalize, Article, Error, Result, ScopeProfile, Tables};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as TokioMutex;

use crate::logging::Logger;
use crate::providers::{FetchRequest, NewsProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquirerConfig {
    /// Upper bound for every single provider call
    pub timeout: Duration,
}

impl Default for AcquirerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
        }
    }
}

/// A caller's request for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsQuery {
    #[serde(default = "NewsQuery::default_scope")]
    pub scope: String,
    #[serde(default, rename = "q")]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Single publisher domain replacing the scope's lists
    #[serde(default)]
    pub source: Option<String>,
    /// `auto` or a provider id
    #[serde(default)]
    pub provider: Option<String>,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self::new(Self::default_scope())
    }
}

impl NewsQuery {
    fn default_scope() -> String {
        "nacional".to_string()
    }

    pub fn new(scope: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            query: None,
            category: None,
            date: None,
            source: None,
            provider: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// The explicitly requested provider, if not `auto`.
    pub fn selected_provider(&self) -> Option<&str> {
        self.provider
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty() && !p.eq_ignore_ascii_case("auto"))
    }

    fn non_blank(value: &Option<String>) -> Option<String> {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

/// Providers that answered 429 during a run. Shared by every scope of a batch.
///
/// Best effort: a provider is marked only once its 429 arrives, so scopes
/// already in flight against it may still send their own request.
#[derive(Debug, Clone, Default)]
pub struct RunLedger {
    limited: Arc<TokioMutex<HashSet<String>>>,
}

impl RunLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn is_limited(&self, provider: &str) -> bool {
        self.limited.lock().await.contains(provider)
    }

    pub async fn mark_limited(&self, provider: &str) {
        self.limited.lock().await.insert(provider.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum ProviderOutcome {
    Articles(usize),
    Empty,
    NotConfigured,
    RateLimited,
    /// Skipped because it was rate limited earlier in the run
    Skipped,
    TimedOut,
    Failed(String),
}

impl ProviderOutcome {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ProviderOutcome::RateLimited
                | ProviderOutcome::Skipped
                | ProviderOutcome::TimedOut
                | ProviderOutcome::Failed(_)
        )
    }
}

impl fmt::Display for ProviderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOutcome::Articles(n) => write!(f, "{} articles", n),
            ProviderOutcome::Empty => f.write_str("no articles"),
            ProviderOutcome::NotConfigured => f.write_str("not configured"),
            ProviderOutcome::RateLimited => f.write_str("rate limited"),
            ProviderOutcome::Skipped => f.write_str("skipped, rate limited earlier"),
            ProviderOutcome::TimedOut => f.write_str("timed out"),
            ProviderOutcome::Failed(e) => write!(f, "failed: {}", e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderReport {
    pub provider: String,
    /// `left` or `right` for the halves of a split query
    #[serde(skip_serializing_if = "Option::is_none")]
    pub half: Option<&'static str>,
    pub outcome: ProviderOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquireStatus {
    Served,
    /// Every provider answered, none had articles
    NoData,
    /// At least one provider errored and none had articles
    Failed,
}

#[derive(Debug, Clone)]
pub struct Acquisition {
    pub scope: String,
    pub articles: Vec<Article>,
    pub served_by: Option<String>,
    pub reports: Vec<ProviderReport>,
}

impl Acquisition {
    pub fn status(&self) -> AcquireStatus {
        if !self.articles.is_empty() {
            AcquireStatus::Served
        } else if self.reports.iter().any(|r| r.outcome.is_error()) {
            AcquireStatus::Failed
        } else {
            AcquireStatus::NoData
        }
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

/// Walks the provider chain for a scope.
pub struct Acquirer {
    providers: Vec<Arc<dyn NewsProvider>>,
    tables: Arc<Tables>,
    config: AcquirerConfig,
}

impl fmt::Debug for Acquirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Acquirer")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.metadata().id).collect::<Vec<_>>(),
            )
            .field("config", &self.config)
            .finish()
    }
}

impl Acquirer {
    /// `providers` must be in priority order.
    pub fn new(providers: Vec<Arc<dyn NewsProvider>>, tables: Arc<Tables>, config: AcquirerConfig) -> Self {
        Self {
            providers,
            tables,
            config,
        }
    }

    pub fn providers(&self) -> &[Arc<dyn NewsProvider>] {
        &self.providers
    }

    pub fn tables(&self) -> &Tables {
        &self.tables
    }

    pub fn find_provider(&self, name: &str) -> Result<Arc<dyn NewsProvider>> {
        let name = name.to_lowercase();
        self.providers
            .iter()
            .find(|p| p.cli_names().iter().any(|n| *n == name))
            .cloned()
            .ok_or_else(|| Error::Config(format!("Unknown provider: {}", name)))
    }

    pub async fn acquire(&self, query: &NewsQuery) -> Result<Acquisition> {
        self.acquire_with(query, &RunLedger::new()).await
    }

    /// Acquire several scopes concurrently. A provider rate limited for one
    /// scope is skipped for the others.
    pub async fn acquire_many(&self, queries: &[NewsQuery]) -> Vec<Result<Acquisition>> {
        let ledger = RunLedger::new();
        join_all(queries.iter().map(|q| self.acquire_with(q, &ledger))).await
    }

    pub async fn acquire_with(&self, query: &NewsQuery, ledger: &RunLedger) -> Result<Acquisition> {
        let profile = self.profile_for(query)?;
        let base = self.base_request(query, &profile);

        let chain = match query.selected_provider() {
            Some(name) => vec![self.find_provider(name)?],
            None => self.providers.clone(),
        };

        let mut reports = Vec::new();
        for provider in chain {
            let (articles, mut provider_reports) =
                self.fetch_from(&provider, &base, &profile, ledger).await;
            reports.append(&mut provider_reports);
            if !articles.is_empty() {
                let served_by = provider.metadata().id.to_string();
                tracing::info!(
                    "📰 [{}] {} articles from {}",
                    profile.id,
                    articles.len(),
                    served_by
                );
                return Ok(Acquisition {
                    scope: profile.id.clone(),
                    articles,
                    served_by: Some(served_by),
                    reports,
                });
            }
        }

        tracing::warn!("🕳️ [{}] provider chain exhausted without articles", profile.id);
        Ok(Acquisition {
            scope: profile.id.clone(),
            articles: Vec::new(),
            served_by: None,
            reports,
        })
    }

    fn profile_for(&self, query: &NewsQuery) -> Result<ScopeProfile> {
        let profile = self.tables.scope(&query.scope)?;
        Ok(match NewsQuery::non_blank(&query.source) {
            Some(domain) => profile.restricted_to(&domain),
            None => profile.clone(),
        })
    }

    fn base_request(&self, query: &NewsQuery, profile: &ScopeProfile) -> FetchRequest {
        let category = NewsQuery::non_blank(&query.category);
        FetchRequest {
            query: NewsQuery::non_blank(&query.query),
            category_query: category
                .as_deref()
                .and_then(|c| self.tables.category_query(c))
                .map(str::to_string),
            category,
            date: query.date,
            ..FetchRequest::for_scope(profile)
        }
    }

    async fn fetch_from(
        &self,
        provider: &Arc<dyn NewsProvider>,
        base: &FetchRequest,
        profile: &ScopeProfile,
        ledger: &RunLedger,
    ) -> (Vec<Article>, Vec<ProviderReport>) {
        if !provider.supports_domains() {
            let (articles, report) = self.call(provider, base, None, &profile.id, ledger).await;
            return (articles, vec![report]);
        }

        if !profile.has_split() {
            let request = base.clone().with_domains(profile.all_domains());
            let (articles, report) = self.call(provider, &request, None, &profile.id, ledger).await;
            return (articles, vec![report]);
        }

        let left = base.clone().with_domains(profile.left_domains.clone());
        let right = base.clone().with_domains(profile.right_domains.clone());
        let ((mut articles, left_report), (mut right_articles, right_report)) = join(
            self.call(provider, &left, Some("left"), &profile.id, ledger),
            self.call(provider, &right, Some("right"), &profile.id, ledger),
        )
        .await;
        articles.append(&mut right_articles);
        (articles, vec![left_report, right_report])
    }

    async fn call(
        &self,
        provider: &Arc<dyn NewsProvider>,
        request: &FetchRequest,
        half: Option<&'static str>,
        scope: &str,
        ledger: &RunLedger,
    ) -> (Vec<Article>, ProviderReport) {
        let meta = provider.metadata();
        let mut logger = Logger::for_provider(&meta).with_prefix(scope);
        if let Some(half) = half {
            logger = logger.with_prefix(half);
        }

        let (articles, outcome) = if ledger.is_limited(meta.id).await {
            (Vec::new(), ProviderOutcome::Skipped)
        } else {
            match tokio::time::timeout(self.config.timeout, provider.fetch(request)).await {
                Err(_) => (Vec::new(), ProviderOutcome::TimedOut),
                // only usable articles count towards serving the request
                Ok(Ok(articles)) => match normalize(articles) {
                    articles if articles.is_empty() => (articles, ProviderOutcome::Empty),
                    articles => {
                        let n = articles.len();
                        (articles, ProviderOutcome::Articles(n))
                    }
                },
                Ok(Err(Error::RateLimited(_))) => {
                    ledger.mark_limited(meta.id).await;
                    (Vec::new(), ProviderOutcome::RateLimited)
                }
                Ok(Err(Error::NotConfigured(_))) => (Vec::new(), ProviderOutcome::NotConfigured),
                Ok(Err(e)) => (Vec::new(), ProviderOutcome::Failed(e.to_string())),
            }
        };

        match &outcome {
            ProviderOutcome::Articles(_) => logger.info(&format!("✨ {}", outcome)),
            ProviderOutcome::Empty | ProviderOutcome::NotConfigured => {
                logger.debug(&outcome.to_string())
            }
            _ => logger.warn(&format!("⚠️ {}", outcome)),
        }

        (
            articles,
            ProviderReport {
                provider: meta.id.to_string(),
                half,
                outcome,
            },
        )
    }
}
