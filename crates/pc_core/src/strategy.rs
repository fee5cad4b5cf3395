use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::clustering::ClusteringEngine;
use crate::types::{Article, StoryCluster};
use crate::Result;

/// Anything that can turn a deduplicated article list into surfaced clusters.
#[async_trait]
pub trait ClusterProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn cluster(&self, articles: &[Article]) -> Result<Vec<StoryCluster>>;
}

#[async_trait]
impl ClusterProvider for ClusteringEngine {
    fn name(&self) -> &str {
        "deterministic"
    }

    async fn cluster(&self, articles: &[Article]) -> Result<Vec<StoryCluster>> {
        Ok(ClusteringEngine::cluster(self, articles.to_vec()))
    }
}

/// Why the deterministic engine produced the result.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    NoEnhancer,
    Failed(String),
    TimedOut,
    Empty,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::NoEnhancer => f.write_str("no enhanced clusterer configured"),
            FallbackReason::Failed(e) => write!(f, "enhanced clusterer failed: {}", e),
            FallbackReason::TimedOut => f.write_str("enhanced clusterer missed its deadline"),
            FallbackReason::Empty => f.write_str("enhanced clusterer returned no clusters"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Clustering {
    Enhanced {
        provider: String,
        clusters: Vec<StoryCluster>,
    },
    Deterministic {
        clusters: Vec<StoryCluster>,
        reason: FallbackReason,
    },
}

impl Clustering {
    pub fn clusters(&self) -> &[StoryCluster] {
        match self {
            Clustering::Enhanced { clusters, .. } | Clustering::Deterministic { clusters, .. } => {
                clusters
            }
        }
    }

    pub fn into_clusters(self) -> Vec<StoryCluster> {
        match self {
            Clustering::Enhanced { clusters, .. } | Clustering::Deterministic { clusters, .. } => {
                clusters
            }
        }
    }

    pub fn is_enhanced(&self) -> bool {
        matches!(self, Clustering::Enhanced { .. })
    }
}

/// Tries an optional enhanced clusterer under a deadline, falling back to the
/// deterministic engine on any failure.
pub struct ClusterStrategy {
    enhanced: Option<Arc<dyn ClusterProvider>>,
    deterministic: ClusteringEngine,
    deadline: Duration,
}

impl fmt::Debug for ClusterStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterStrategy")
            .field("enhanced", &self.enhanced.as_ref().map(|p| p.name().to_string()))
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl ClusterStrategy {
    pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(20);

    pub fn deterministic(engine: ClusteringEngine) -> Self {
        Self {
            enhanced: None,
            deterministic: engine,
            deadline: Self::DEFAULT_DEADLINE,
        }
    }

    pub fn with_enhanced(mut self, provider: Arc<dyn ClusterProvider>, deadline: Duration) -> Self {
        self.enhanced = Some(provider);
        self.deadline = deadline;
        self
    }

    pub fn engine(&self) -> &ClusteringEngine {
        &self.deterministic
    }

    pub async fn run(&self, articles: &[Article]) -> Clustering {
        let reason = match &self.enhanced {
            None => FallbackReason::NoEnhancer,
            Some(provider) => {
                match tokio::time::timeout(self.deadline, provider.cluster(articles)).await {
                    Ok(Ok(clusters)) if !clusters.is_empty() => {
                        info!("🧠 {} produced {} clusters", provider.name(), clusters.len());
                        return Clustering::Enhanced {
                            provider: provider.name().to_string(),
                            clusters,
                        };
                    }
                    Ok(Ok(_)) => FallbackReason::Empty,
                    Ok(Err(e)) => FallbackReason::Failed(e.to_string()),
                    Err(_) => FallbackReason::TimedOut,
                }
            }
        };

        if reason != FallbackReason::NoEnhancer {
            warn!("↩️ Falling back to deterministic clustering: {}", reason);
        }
        Clustering::Deterministic {
            clusters: self.deterministic.cluster(articles.to_vec()),
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use chrono::Utc;

    struct Scripted(std::result::Result<Vec<StoryCluster>, String>, Duration);

    #[async_trait]
    impl ClusterProvider for Scripted {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn cluster(&self, _articles: &[Article]) -> Result<Vec<StoryCluster>> {
            tokio::time::sleep(self.1).await;
            self.0.clone().map_err(Error::Inference)
        }
    }

    fn articles() -> Vec<Article> {
        vec![
            Article::new("https://emol.com/1", "Boric visita Temuco hoy", "emol.com", Utc::now()),
            Article::new("https://elmostrador.cl/2", "Boric visita Temuco", "elmostrador.cl", Utc::now()),
        ]
    }

    fn strategy(provider: Scripted) -> ClusterStrategy {
        ClusterStrategy::deterministic(ClusteringEngine::default())
            .with_enhanced(Arc::new(provider), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn test_no_enhancer_uses_engine() {
        let result = ClusterStrategy::deterministic(ClusteringEngine::default())
            .run(&articles())
            .await;
        assert!(matches!(
            result,
            Clustering::Deterministic { reason: FallbackReason::NoEnhancer, .. }
        ));
        assert_eq!(result.clusters().len(), 1);
    }

    #[tokio::test]
    async fn test_enhanced_result_is_used() {
        let canned = StoryCluster::seed(articles().remove(0));
        let result = strategy(Scripted(Ok(vec![canned]), Duration::ZERO))
            .run(&articles())
            .await;
        assert!(result.is_enhanced());
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let result = strategy(Scripted(Err("bad json".into()), Duration::ZERO))
            .run(&articles())
            .await;
        match result {
            Clustering::Deterministic { clusters, reason } => {
                assert_eq!(clusters.len(), 1);
                assert!(matches!(reason, FallbackReason::Failed(e) if e.contains("bad json")));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_and_slow_fall_back() {
        let empty = strategy(Scripted(Ok(vec![]), Duration::ZERO)).run(&articles()).await;
        assert!(matches!(empty, Clustering::Deterministic { reason: FallbackReason::Empty, .. }));

        let slow = strategy(Scripted(Ok(vec![]), Duration::from_secs(5))).run(&articles()).await;
        assert!(matches!(slow, Clustering::Deterministic { reason: FallbackReason::TimedOut, .. }));
    }
}
