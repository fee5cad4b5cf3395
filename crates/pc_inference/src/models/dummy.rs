use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use pc_core::{Error, InferenceModel, Result};

/// Offline model that plays back canned replies in order. With nothing left
/// to say it fails, which callers treat as "no enhancement".
pub struct DummyModel {
    replies: Mutex<VecDeque<String>>,
    delay: Duration,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").field("delay", &self.delay).finish()
    }
}

impl DummyModel {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            delay: Duration::ZERO,
        }
    }

    pub fn replying(reply: impl Into<String>) -> Self {
        Self::new(vec![reply.into()])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn next_reply(&self) -> Option<String> {
        self.replies.lock().ok().and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "dummy"
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.next_reply()
            .ok_or_else(|| Error::Inference("dummy model has no replies left".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_plays_back_in_order() {
        let model = DummyModel::new(vec!["uno".into(), "dos".into()]);
        assert_eq!(model.generate("a").await.unwrap(), "uno");
        assert_eq!(model.generate("b").await.unwrap(), "dos");
        assert!(model.generate("c").await.is_err());
    }
}
