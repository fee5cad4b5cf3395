use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use pc_core::{
    content_key, prepare, Article, ClusterAnalysis, ClusterStorage, ClusterStrategy, Clustering,
    Digest, Error, Result, StoryCluster,
};
use pc_inference::ClusterAnalyzer;
use serde::Serialize;
use tracing::{info, warn};

use crate::acquirer::{AcquireStatus, Acquirer, Acquisition, NewsQuery, ProviderReport, RunLedger};

/// Where the clusters of a report came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Live,
    Cache,
    Nothing,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsReport {
    pub scope: String,
    pub clusters: Vec<StoryCluster>,
    pub status: AcquireStatus,
    pub origin: Origin,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub served_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clustered_by: Option<String>,
    pub raw_article_count: usize,
    pub reports: Vec<ProviderReport>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DigestOutcome {
    Stored {
        scope: String,
        clusters: usize,
        raw_articles: usize,
    },
    Skipped {
        scope: String,
        status: AcquireStatus,
    },
    Failed {
        scope: String,
        error: String,
    },
}

impl fmt::Display for DigestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestOutcome::Stored {
                scope,
                clusters,
                raw_articles,
            } => write!(f, "{}: stored {} clusters from {} articles", scope, clusters, raw_articles),
            DigestOutcome::Skipped { scope, status } => {
                write!(f, "{}: skipped, acquisition {:?}", scope, status)
            }
            DigestOutcome::Failed { scope, error } => write!(f, "{}: failed, {}", scope, error),
        }
    }
}

/// Acquire → dedupe → cluster, with storage-backed fallback and analysis.
pub struct Pipeline {
    acquirer: Acquirer,
    strategy: ClusterStrategy,
    storage: Option<Arc<dyn ClusterStorage>>,
    analyzer: Option<Arc<ClusterAnalyzer>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("acquirer", &self.acquirer)
            .field("strategy", &self.strategy)
            .field("storage", &self.storage.is_some())
            .field("analyzer", &self.analyzer)
            .finish()
    }
}

impl Pipeline {
    pub fn new(acquirer: Acquirer, strategy: ClusterStrategy) -> Self {
        Self {
            acquirer,
            strategy,
            storage: None,
            analyzer: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn ClusterStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<ClusterAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn acquirer(&self) -> &Acquirer {
        &self.acquirer
    }

    /// One interactive request. Only configuration errors (unknown scope or
    /// provider) are returned as `Err`.
    pub async fn run(&self, query: &NewsQuery) -> Result<NewsReport> {
        let acquisition = self.acquirer.acquire(query).await?;
        if acquisition.is_empty() {
            return Ok(self.from_cache(acquisition).await);
        }

        let status = acquisition.status();
        let raw_article_count = acquisition.articles.len();
        let (clusters, clustered_by) = self.cluster(acquisition.articles).await;
        info!(
            "🧩 [{}] {} articles → {} clusters ({})",
            acquisition.scope,
            raw_article_count,
            clusters.len(),
            clustered_by
        );

        Ok(NewsReport {
            scope: acquisition.scope,
            clusters,
            status,
            origin: Origin::Live,
            warning: None,
            served_by: acquisition.served_by,
            clustered_by: Some(clustered_by),
            raw_article_count,
            reports: acquisition.reports,
        })
    }

    /// Batch run over several scopes sharing one rate-limit ledger. Each scope
    /// with articles is clustered, optionally analysed and stored.
    pub async fn run_digest(&self, scopes: &[String]) -> Result<Vec<DigestOutcome>> {
        let storage = self
            .storage
            .clone()
            .ok_or_else(|| Error::Config("digest runs need a storage backend".to_string()))?;

        let ledger = RunLedger::new();
        let outcomes = join_all(
            scopes
                .iter()
                .map(|scope| self.digest_scope(scope, &ledger, storage.as_ref())),
        )
        .await;

        for outcome in &outcomes {
            match outcome {
                DigestOutcome::Failed { .. } => warn!("📦 {}", outcome),
                _ => info!("📦 {}", outcome),
            }
        }
        Ok(outcomes)
    }

    /// Cached analysis for a set of items, computed and stored on a miss.
    /// `Ok(None)` when no analyzer is configured or the model gave nothing usable.
    pub async fn analyze(&self, items: &[Article]) -> Result<Option<ClusterAnalysis>> {
        if items.is_empty() {
            return Err(Error::Config("no items to analyse".to_string()));
        }
        let key = content_key(items.iter().map(|a| a.url.as_str()));

        if let Some(cached) = self.cached_analysis(&key).await {
            info!("💾 Analysis cache hit {}", &key[..12.min(key.len())]);
            return Ok(Some(cached));
        }

        let analyzer = match &self.analyzer {
            Some(analyzer) => analyzer,
            None => return Ok(None),
        };
        let items = self.classified(items);
        let analysis = analyzer.analyze(&items).await;
        if let (Some(analysis), Some(storage)) = (&analysis, &self.storage) {
            if let Err(e) = storage.store_analysis(&key, analysis).await {
                warn!("⚠️ Could not cache analysis: {}", e);
            }
        }
        Ok(analysis)
    }

    async fn cluster(&self, articles: Vec<Article>) -> (Vec<StoryCluster>, String) {
        let articles = prepare(articles);
        match self.strategy.run(&articles).await {
            Clustering::Enhanced { provider, clusters } => (clusters, provider),
            Clustering::Deterministic { clusters, .. } => (clusters, "deterministic".to_string()),
        }
    }

    fn classified(&self, items: &[Article]) -> Vec<Article> {
        let classifier = self.strategy.engine().classifier();
        items
            .iter()
            .cloned()
            .map(|mut a| {
                if a.bias.is_none() {
                    a.bias = Some(classifier.classify(&a.source));
                }
                a
            })
            .collect()
    }

    async fn cached_analysis(&self, key: &str) -> Option<ClusterAnalysis> {
        let storage = self.storage.as_ref()?;
        match storage.get_analysis(key).await {
            Ok(found) => found,
            Err(e) => {
                warn!("⚠️ Analysis cache lookup failed: {}", e);
                None
            }
        }
    }

    async fn from_cache(&self, acquisition: Acquisition) -> NewsReport {
        let status = acquisition.status();
        let digest = match &self.storage {
            Some(storage) => match storage.latest_digest(&acquisition.scope).await {
                Ok(digest) => digest,
                Err(e) => {
                    warn!("⚠️ Could not read cached digest: {}", e);
                    None
                }
            },
            None => None,
        };

        let (clusters, origin, warning, raw_article_count) = match digest {
            Some(digest) => {
                warn!("💾 [{}] serving cached digest from {}", acquisition.scope, digest.date);
                (
                    self.strategy.engine().diversity().filter(digest.clusters),
                    Origin::Cache,
                    format!("Live sources unavailable, showing the digest from {}", digest.date),
                    digest.raw_article_count,
                )
            }
            None => {
                let warning = match status {
                    AcquireStatus::Failed => "All providers failed or are rate limited",
                    _ => "No provider returned articles",
                };
                (Vec::new(), Origin::Nothing, warning.to_string(), 0)
            }
        };

        NewsReport {
            scope: acquisition.scope,
            clusters,
            status,
            origin,
            warning: Some(warning),
            served_by: None,
            clustered_by: None,
            raw_article_count,
            reports: acquisition.reports,
        }
    }

    async fn digest_scope(
        &self,
        scope: &str,
        ledger: &RunLedger,
        storage: &dyn ClusterStorage,
    ) -> DigestOutcome {
        let failed = |e: Error| DigestOutcome::Failed {
            scope: scope.to_string(),
            error: e.to_string(),
        };

        let acquisition = match self.acquirer.acquire_with(&NewsQuery::new(scope), ledger).await {
            Ok(acquisition) => acquisition,
            Err(e) => return failed(e),
        };
        if acquisition.is_empty() {
            return DigestOutcome::Skipped {
                scope: scope.to_string(),
                status: acquisition.status(),
            };
        }

        let raw_article_count = acquisition.articles.len();
        let (mut clusters, _) = self.cluster(acquisition.articles).await;

        if let Some(analyzer) = &self.analyzer {
            for cluster in clusters.iter_mut().filter(|c| c.len() >= 2) {
                let key = cluster.content_key();
                cluster.analysis = match self.cached_analysis(&key).await {
                    Some(cached) => Some(cached),
                    None => {
                        let analysis = analyzer.analyze(&cluster.items).await;
                        if let Some(analysis) = &analysis {
                            if let Err(e) = storage.store_analysis(&key, analysis).await {
                                warn!("⚠️ Could not cache analysis: {}", e);
                            }
                        }
                        analysis
                    }
                };
            }
        }

        let digest = Digest {
            scope: scope.to_string(),
            date: Utc::now().date_naive(),
            cluster_count: clusters.len(),
            clusters,
            raw_article_count,
            created_at: Utc::now(),
        };
        match storage.store_digest(&digest).await {
            Ok(()) => DigestOutcome::Stored {
                scope: scope.to_string(),
                clusters: digest.cluster_count,
                raw_articles: raw_article_count,
            },
            Err(e) => failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquirer::AcquirerConfig;
    use crate::providers::{FetchRequest, NewsProvider, ProviderMetadata};
    use async_trait::async_trait;
    use chrono::Duration;
    use pc_core::{ClusteringEngine, Tables};
    use pc_inference::models::DummyModel;
    use pc_storage::MemoryStorage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ANALYSIS: &str = r#"{"resumen_ejecutivo": "Dos miradas", "kpis": {"polarizacion": 6, "diversidad": "ALTA"}}"#;

    /// Serves the Senado/pensiones pair for `nacional`, nothing elsewhere.
    struct Fixture {
        calls: AtomicUsize,
        empty: bool,
    }

    #[async_trait]
    impl NewsProvider for Fixture {
        fn metadata(&self) -> ProviderMetadata {
            ProviderMetadata {
                id: "fixture",
                name: "Fixture",
                emoji: "🧪",
            }
        }

        async fn fetch(&self, request: &FetchRequest) -> Result<Vec<Article>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.empty || request.country.as_deref() != Some("cl") {
                return Ok(Vec::new());
            }
            let now = Utc::now();
            Ok(vec![
                Article::new(
                    "https://www.latercera.com/politica/senado-pensiones",
                    "Senado aprueba nueva ley de pensiones - La Tercera",
                    "latercera.com",
                    now - Duration::hours(2),
                ),
                Article::new(
                    "https://www.elmostrador.cl/noticias/pais/oposicion",
                    "Oposición critica aprobación de ley de pensiones en el Senado",
                    "elmostrador.cl",
                    now,
                ),
                Article::new("https://www.emol.com/y", "Incendio en Valparaíso", "emol.com", now),
            ])
        }
    }

    fn pipeline(empty: bool) -> (Pipeline, Arc<MemoryStorage>) {
        let acquirer = Acquirer::new(
            vec![Arc::new(Fixture {
                calls: AtomicUsize::new(0),
                empty,
            })],
            Arc::new(Tables::default()),
            AcquirerConfig::default(),
        );
        let storage = Arc::new(MemoryStorage::new());
        let pipeline = Pipeline::new(acquirer, ClusterStrategy::deterministic(ClusteringEngine::default()))
            .with_storage(storage.clone());
        (pipeline, storage)
    }

    #[tokio::test]
    async fn test_run_clusters_live_articles() {
        let (pipeline, _) = pipeline(false);
        let report = pipeline.run(&NewsQuery::new("nacional")).await.unwrap();

        assert_eq!(report.origin, Origin::Live);
        assert_eq!(report.status, AcquireStatus::Served);
        assert_eq!(report.raw_article_count, 3);
        assert_eq!(report.clusters.len(), 1);
        assert_eq!(report.clustered_by.as_deref(), Some("deterministic"));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("warning").is_none());
        assert_eq!(json["status"], "served");
    }

    #[tokio::test]
    async fn test_empty_run_serves_cached_digest() {
        let (live, storage) = pipeline(false);
        let outcomes = live
            .run_digest(&["nacional".to_string(), "anglo".to_string()])
            .await
            .unwrap();
        assert!(matches!(outcomes[0], DigestOutcome::Stored { clusters: 1, raw_articles: 3, .. }));
        assert!(matches!(
            outcomes[1],
            DigestOutcome::Skipped { status: AcquireStatus::NoData, .. }
        ));

        let (offline, _) = pipeline(true);
        let offline = offline.with_storage(storage);
        let report = offline.run(&NewsQuery::new("nacional")).await.unwrap();
        assert_eq!(report.origin, Origin::Cache);
        assert_eq!(report.clusters.len(), 1);
        assert!(report.warning.unwrap().contains("digest"));

        let nothing = offline.run(&NewsQuery::new("anglo")).await.unwrap();
        assert_eq!(nothing.origin, Origin::Nothing);
        assert!(nothing.clusters.is_empty());
        assert_eq!(nothing.status, AcquireStatus::NoData);
    }

    #[tokio::test]
    async fn test_digest_attaches_cached_analysis() {
        let (pipeline, storage) = pipeline(false);
        let model = Arc::new(DummyModel::replying(ANALYSIS));
        let pipeline = pipeline.with_analyzer(Arc::new(ClusterAnalyzer::new(model)));

        pipeline.run_digest(&["nacional".to_string()]).await.unwrap();
        let digest = storage.latest_digest("nacional").await.unwrap().unwrap();
        let cluster = &digest.clusters[0];
        let analysis = cluster.analysis.as_ref().unwrap();
        assert_eq!(analysis.kpis.diversity, "ALTA");

        // the dummy has no replies left, so this must come from the cache
        let again = pipeline.analyze(&cluster.items).await.unwrap();
        assert_eq!(again.as_ref(), Some(analysis));
    }

    #[tokio::test]
    async fn test_analyze_requires_items_and_analyzer() {
        let (pipeline, _) = pipeline(false);
        assert!(matches!(pipeline.analyze(&[]).await, Err(Error::Config(_))));

        let item = Article::new("https://www.emol.com/a", "Titular", "emol.com", Utc::now());
        assert_eq!(pipeline.analyze(&[item]).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_digest_needs_storage() {
        let acquirer = Acquirer::new(Vec::new(), Arc::new(Tables::default()), AcquirerConfig::default());
        let pipeline = Pipeline::new(acquirer, ClusterStrategy::deterministic(ClusteringEngine::default()));
        assert!(pipeline.run_digest(&["nacional".to_string()]).await.is_err());
    }
}
