use std::sync::Arc;

use pc_core::{ClusterStorage, Error, Result};
use tracing::info;

pub mod backends;

pub use backends::*;

/// Build a storage backend by name: `memory`, or `json` rooted at `path`.
pub async fn create_storage(kind: &str, path: Option<&str>) -> Result<Arc<dyn ClusterStorage>> {
    let storage: Arc<dyn ClusterStorage> = match kind {
        "memory" => Arc::new(MemoryStorage::new()),
        "json" => {
            let path = path.ok_or_else(|| {
                Error::Config("json storage needs a directory (--storage-path)".to_string())
            })?;
            Arc::new(JsonFileStorage::open(path).await?)
        }
        other => return Err(Error::Config(format!("Unknown storage backend: {}", other))),
    };
    info!("💾 Storage ready ({})", kind);
    Ok(storage)
}

/// Reject identifiers that could escape a storage namespace.
pub(crate) fn check_key(kind: &str, key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("Invalid {} key: {:?}", kind, key)))
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::create_storage;
    pub use pc_core::ClusterStorage;
}
