use std::sync::Arc;

use pc_core::{Error, InferenceModel, Result};
use tracing::info;

use crate::Config;

pub mod deepseek;
pub mod dummy;
pub mod gemini;

pub use deepseek::DeepSeekModel;
pub use dummy::DummyModel;
pub use gemini::GeminiModel;

/// Build the model named by `config.model_name`. Gemini is the default.
pub async fn create_model(config: Option<Config>) -> Result<Arc<dyn InferenceModel>> {
    let config = config.unwrap_or_default();
    let name = config
        .model_name
        .clone()
        .unwrap_or_else(|| GeminiModel::DEFAULT_MODEL.to_string());

    let model: Arc<dyn InferenceModel> = if name == "dummy" {
        Arc::new(DummyModel::new(Vec::new()))
    } else if name.starts_with("deepseek") {
        Arc::new(DeepSeekModel::new(config.api_key, Some(name))?)
    } else if name.starts_with("gemini") {
        Arc::new(GeminiModel::new(config.api_key, Some(name))?)
    } else {
        return Err(Error::Config(format!("Unknown model: {}", name)));
    };

    info!("🧠 Inference model ready: {}", model.name());
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_model_by_name() {
        let dummy = create_model(Some(Config {
            model_name: Some("dummy".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
        assert_eq!(dummy.name(), "dummy");

        let deepseek = create_model(Some(Config {
            api_key: Some("k".into()),
            model_name: Some("deepseek-chat".into()),
            ..Default::default()
        }))
        .await
        .unwrap();
        assert_eq!(deepseek.name(), "deepseek-chat");

        let missing_key = create_model(None).await;
        assert!(matches!(missing_key, Err(Error::NotConfigured(_))));

        let unknown = create_model(Some(Config {
            api_key: Some("k".into()),
            model_name: Some("llama".into()),
            ..Default::default()
        }))
        .await;
        assert!(matches!(unknown, Err(Error::Config(_))));
    }
}
