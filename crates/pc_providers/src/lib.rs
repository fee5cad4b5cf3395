pub mod acquirer;
pub mod cli;
pub mod logging;
pub mod pipeline;
pub mod providers;

pub use acquirer::{
    AcquireStatus, Acquirer, AcquirerConfig, Acquisition, NewsQuery, ProviderOutcome,
    ProviderReport, RunLedger,
};
pub use cli::{handle_command, ProviderArgs, ProviderCommands};
pub use logging::{init_logging, Logger};
pub use pipeline::{DigestOutcome, NewsReport, Origin, Pipeline};
pub use providers::{default_providers, FetchRequest, NewsProvider, ProviderKeys, ProviderMetadata};

pub mod prelude {
    pub use super::providers::NewsProvider;
    pub use super::{Acquirer, NewsQuery, Pipeline};
    pub use pc_core::{Article, Error, Result};
}
