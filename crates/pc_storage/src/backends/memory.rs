use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use pc_core::{ClusterAnalysis, ClusterStorage, Digest, Result};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryStore {
    digests: HashMap<String, BTreeMap<NaiveDate, Digest>>,
    analyses: HashMap<String, ClusterAnalysis>,
}

/// Process-local storage. Everything is lost on exit.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    store: Arc<RwLock<MemoryStore>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClusterStorage for MemoryStorage {
    async fn store_digest(&self, digest: &Digest) -> Result<()> {
        let mut store = self.store.write().await;
        store
            .digests
            .entry(digest.scope.clone())
            .or_default()
            .insert(digest.date, digest.clone());
        Ok(())
    }

    async fn latest_digest(&self, scope: &str) -> Result<Option<Digest>> {
        let store = self.store.read().await;
        Ok(store
            .digests
            .get(scope)
            .and_then(|by_date| by_date.values().next_back())
            .cloned())
    }

    async fn store_analysis(&self, key: &str, analysis: &ClusterAnalysis) -> Result<()> {
        let mut store = self.store.write().await;
        store.analyses.insert(key.to_string(), analysis.clone());
        Ok(())
    }

    async fn get_analysis(&self, key: &str) -> Result<Option<ClusterAnalysis>> {
        let store = self.store.read().await;
        Ok(store.analyses.get(key).cloned())
    }
}
