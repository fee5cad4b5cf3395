use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pc_core::{ClusterAnalysis, ClusterStorage, Digest, Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::check_key;

/// One JSON document per digest and per analysis under a root directory:
/// `digests/<scope>/<date>.json` and `analyses/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    pub async fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(root.join("digests")).await?;
        tokio::fs::create_dir_all(root.join("analyses")).await?;
        Ok(Self { root })
    }

    fn scope_dir(&self, scope: &str) -> Result<PathBuf> {
        check_key("scope", scope)?;
        Ok(self.root.join("digests").join(scope))
    }

    fn analysis_path(&self, key: &str) -> Result<PathBuf> {
        check_key("analysis", key)?;
        Ok(self.root.join("analyses").join(format!("{}.json", key)))
    }

    async fn write<T: Serialize>(path: &Path, value: &T) -> Result<()> {
        let json = serde_json::to_vec_pretty(value)?;
        // write-then-rename so readers never see half a document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        debug!("💾 Wrote {}", path.display());
        Ok(())
    }

    async fn read<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[async_trait]
impl ClusterStorage for JsonFileStorage {
    async fn store_digest(&self, digest: &Digest) -> Result<()> {
        let dir = self.scope_dir(&digest.scope)?;
        tokio::fs::create_dir_all(&dir).await?;
        let path = dir.join(format!("{}.json", digest.date.format("%Y-%m-%d")));
        Self::write(&path, digest).await
    }

    async fn latest_digest(&self, scope: &str) -> Result<Option<Digest>> {
        let dir = self.scope_dir(scope)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::Io(e)),
        };

        // ISO dates sort lexicographically
        let mut latest: Option<String> = None;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.ends_with(".json") && latest.as_ref().map_or(true, |l| name > *l) {
                latest = Some(name);
            }
        }

        match latest {
            Some(name) => Self::read(&dir.join(name)).await,
            None => Ok(None),
        }
    }

    async fn store_analysis(&self, key: &str, analysis: &ClusterAnalysis) -> Result<()> {
        Self::write(&self.analysis_path(key)?, analysis).await
    }

    async fn get_analysis(&self, key: &str) -> Result<Option<ClusterAnalysis>> {
        Self::read(&self.analysis_path(key)?).await
    }
}
