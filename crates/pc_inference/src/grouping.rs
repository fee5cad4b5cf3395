use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use pc_core::{Article, ClusterProvider, ClusteringEngine, Error, InferenceModel, Result, StoryCluster};
use serde::Serialize;
use tracing::debug;

use crate::strip_fences;

const DESCRIPTION_CHARS: usize = 100;

#[derive(Serialize)]
struct PromptItem<'a> {
    id: usize,
    title: &'a str,
    desc: String,
}

/// Asks a model to group articles by event. The grouping is fed back through
/// the deterministic engine's bias, blindspot and diversity steps.
pub struct LlmClusterer {
    model: Arc<dyn InferenceModel>,
    engine: ClusteringEngine,
}

impl fmt::Debug for LlmClusterer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmClusterer")
            .field("model", &self.model.name())
            .finish()
    }
}

impl LlmClusterer {
    pub fn new(model: Arc<dyn InferenceModel>, engine: ClusteringEngine) -> Self {
        Self { model, engine }
    }

    fn prompt(articles: &[Article]) -> Result<String> {
        let items: Vec<PromptItem> = articles
            .iter()
            .enumerate()
            .map(|(id, a)| PromptItem {
                id,
                title: &a.title,
                desc: a
                    .description
                    .as_deref()
                    .unwrap_or_default()
                    .chars()
                    .take(DESCRIPTION_CHARS)
                    .collect(),
            })
            .collect();

        Ok(format!(
            "You are an expert news aggregator. Group the following news articles into clusters \
             based on the EVENT they are reporting.\n\
             Articles about the EXACT SAME event/topic should be in the same cluster.\n\
             If an article is unique, it should be in its own cluster.\n\n\
             Input Articles:\n{}\n\n\
             Return a STRICT JSON array of arrays of IDs. Each inner array is a cluster.\n\
             Example: [[0, 2], [1], [3, 4, 5]]\n\
             Return ONLY the JSON. No markdown formatting.",
            serde_json::to_string(&items)?
        ))
    }

    /// Parse and validate the model's reply against the number of inputs.
    pub fn parse_groups(reply: &str, len: usize) -> Result<Vec<Vec<usize>>> {
        let groups: Vec<Vec<usize>> = serde_json::from_str(strip_fences(reply))
            .map_err(|e| Error::Inference(format!("Malformed grouping: {}", e)))?;

        let mut seen = HashSet::new();
        for &index in groups.iter().flatten() {
            if index >= len {
                return Err(Error::Inference(format!(
                    "Grouping references article {} of {}",
                    index, len
                )));
            }
            if !seen.insert(index) {
                return Err(Error::Inference(format!(
                    "Grouping lists article {} twice",
                    index
                )));
            }
        }
        Ok(groups)
    }
}

#[async_trait]
impl ClusterProvider for LlmClusterer {
    fn name(&self) -> &str {
        self.model.name()
    }

    async fn cluster(&self, articles: &[Article]) -> Result<Vec<StoryCluster>> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let reply = self.model.generate(&Self::prompt(articles)?).await?;
        let groups = Self::parse_groups(&reply, articles.len())?;
        debug!("🧠 {} grouped {} articles into {} groups", self.name(), articles.len(), groups.len());

        let groups = groups
            .into_iter()
            .map(|group| group.into_iter().map(|i| articles[i].clone()).collect())
            .collect();
        Ok(self.engine.assemble(groups))
    }
}
