use async_trait::async_trait;
use crate::Result;

#[async_trait]
pub trait InferenceModel: Send + Sync {
    /// Model name for logs
    fn name(&self) -> &str;

    /// Run a single prompt and return the raw text answer
    async fn generate(&self, prompt: &str) -> Result<String>;
}
