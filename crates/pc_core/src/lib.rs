pub mod bias;
pub mod clustering;
pub mod dedup;
pub mod diversity;
pub mod error;
pub mod models;
pub mod scope;
pub mod similarity;
pub mod storage;
pub mod strategy;
pub mod tables;
pub mod types;

pub use bias::{BiasClassifier, BiasTable, KeywordRule};
pub use clustering::{ClusteringConfig, ClusteringEngine};
pub use dedup::{dedupe, normalize, prepare};
pub use diversity::DiversityFilter;
pub use error::{Error, Result};
pub use models::InferenceModel;
pub use scope::ScopeProfile;
pub use similarity::{SimilarityEngine, StopList};
pub use storage::ClusterStorage;
pub use strategy::{ClusterProvider, ClusterStrategy, Clustering, FallbackReason};
pub use tables::Tables;
pub use types::{
    content_key, AnalysisKpis, Article, BiasCategory, BiasDistribution, BlindspotSide,
    ClusterAnalysis, Digest, OutletAudit, StoryCluster,
};
