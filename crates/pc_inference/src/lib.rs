use std::time::Duration;

pub mod analysis;
pub mod grouping;
pub mod models;

pub use analysis::ClusterAnalyzer;
pub use grouping::LlmClusterer;
pub use models::create_model;

#[derive(Clone)]
pub struct Config {
    pub api_key: Option<String>,
    /// `gemini-*`, `deepseek-*` or `dummy`
    pub model_name: Option<String>,
    /// Time allowed for one LLM grouping call before falling back
    pub deadline: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key.as_deref().map(|_| "<redacted>"))
            .field("model_name", &self.model_name)
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model_name: None,
            deadline: pc_core::ClusterStrategy::DEFAULT_DEADLINE,
        }
    }
}

/// Strip markdown code fences some models wrap their JSON in.
pub(crate) fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    text.strip_suffix("```").unwrap_or(text).trim()
}

pub mod prelude {
    pub use super::models::create_model;
    pub use super::{ClusterAnalyzer, Config, LlmClusterer};
    pub use pc_core::{Error, InferenceModel, Result};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n[[0,1]]\n```"), "[[0,1]]");
        assert_eq!(strip_fences("```\n{}\n```  "), "{}");
        assert_eq!(strip_fences(" [[2]] "), "[[2]]");
    }

    #[test]
    fn test_config_debug_redacts_key() {
        let config = Config {
            api_key: Some("sk-live".into()),
            ..Default::default()
        };
        assert!(!format!("{:?}", config).contains("sk-live"));
    }
}
