use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider {0} is rate limited")]
    RateLimited(String),

    #[error("Provider {0} timed out")]
    Timeout(String),

    #[error("Provider {0} is not configured")]
    NotConfigured(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("External error: {0}")]
    External(#[from] anyhow::Error),
}

impl Error {
    /// True for conditions that only affect one provider's contribution to a run.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::Provider(_)
                | Error::RateLimited(_)
                | Error::Timeout(_)
                | Error::Http(_)
                | Error::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
