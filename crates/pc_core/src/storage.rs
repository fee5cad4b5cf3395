use async_trait::async_trait;
use crate::types::{ClusterAnalysis, Digest};
use crate::Result;

#[async_trait]
pub trait ClusterStorage: Send + Sync {
    /// Store the digest of a scope, replacing any digest for the same scope and date
    async fn store_digest(&self, digest: &Digest) -> Result<()>;

    /// Most recent digest stored for a scope
    async fn latest_digest(&self, scope: &str) -> Result<Option<Digest>>;

    /// Cache an analysis under a cluster content key
    async fn store_analysis(&self, key: &str, analysis: &ClusterAnalysis) -> Result<()>;

    /// Cached analysis for a cluster content key
    async fn get_analysis(&self, key: &str) -> Result<Option<ClusterAnalysis>>;
}
