use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::bias::BiasClassifier;
use crate::diversity::DiversityFilter;
use crate::similarity::{jaccard_sets, SimilarityEngine};
use crate::tables::Tables;
use crate::types::{Article, StoryCluster};

/// Thresholds for the same-event decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    /// Maximum distance from a cluster's anchor time.
    pub window_hours: i64,
    /// Shared entities that match on their own.
    pub min_shared_entities: usize,
    /// Jaccard needed alongside a single shared entity.
    pub entity_jaccard: f64,
    /// Jaccard that matches without any shared entity.
    pub jaccard_only: f64,
    /// URL fragment identifying a national outlet, preferred as the cluster's face.
    pub national_marker: String,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            window_hours: 36,
            min_shared_entities: 2,
            entity_jaccard: 0.2,
            jaccard_only: 0.4,
            national_marker: ".cl".to_string(),
        }
    }
}

impl ClusteringConfig {
    pub fn is_same_event(&self, shared_entities: usize, jaccard: f64) -> bool {
        shared_entities >= self.min_shared_entities
            || (shared_entities >= 1 && jaccard > self.entity_jaccard)
            || jaccard > self.jaccard_only
    }

    pub fn within_window(&self, anchor: DateTime<Utc>, published_at: DateTime<Utc>) -> bool {
        (published_at - anchor).num_milliseconds().abs() < Duration::hours(self.window_hours).num_milliseconds()
    }
}

/// A cluster under construction plus the lexical features of its current main title.
struct Draft {
    cluster: StoryCluster,
    tokens: HashSet<String>,
    entities: HashSet<String>,
}

impl Draft {
    fn open(article: Article, similarity: &SimilarityEngine) -> Self {
        let tokens = similarity.tokens(&article.title);
        let entities = similarity.entities(&article.title);
        Self {
            cluster: StoryCluster::seed(article),
            tokens,
            entities,
        }
    }
}

/// Deterministic greedy clustering over headlines.
#[derive(Debug, Clone, Default)]
pub struct ClusteringEngine {
    classifier: BiasClassifier,
    similarity: SimilarityEngine,
    config: ClusteringConfig,
    diversity: DiversityFilter,
}

impl ClusteringEngine {
    pub fn new(
        classifier: BiasClassifier,
        similarity: SimilarityEngine,
        config: ClusteringConfig,
    ) -> Self {
        Self {
            classifier,
            similarity,
            config,
            diversity: DiversityFilter::default(),
        }
    }

    pub fn from_tables(tables: &Tables, config: ClusteringConfig) -> Self {
        Self::new(
            BiasClassifier::new(tables.bias.clone()),
            SimilarityEngine::new(tables.stop_list.clone()),
            config,
        )
    }

    pub fn with_diversity(mut self, diversity: DiversityFilter) -> Self {
        self.diversity = diversity;
        self
    }

    pub fn classifier(&self) -> &BiasClassifier {
        &self.classifier
    }

    pub fn diversity(&self) -> &DiversityFilter {
        &self.diversity
    }

    pub fn config(&self) -> &ClusteringConfig {
        &self.config
    }

    /// Full pass: partition, blindspots, diversity filter.
    pub fn cluster(&self, articles: Vec<Article>) -> Vec<StoryCluster> {
        let total = articles.len();
        let clusters = self.finish(self.partition(articles));
        debug!("🧩 Clustered {} articles into {} diverse clusters", total, clusters.len());
        clusters
    }

    /// Greedy first-match assignment over articles sorted newest first.
    /// Bias counts are filled in; blindspots and filtering are left to `finish`.
    pub fn partition(&self, articles: Vec<Article>) -> Vec<StoryCluster> {
        let mut articles = self.classify_all(articles);
        // stable: ties keep input order
        articles.sort_by(|a, b| b.published_at.cmp(&a.published_at));

        articles
            .into_iter()
            .fold(Vec::new(), |drafts, article| self.assign(drafts, article))
            .into_iter()
            .map(|draft| draft.cluster)
            .collect()
    }

    /// Builds clusters from an externally decided grouping (e.g. an LLM), with the
    /// same bias, blindspot and diversity treatment as `cluster`.
    pub fn assemble(&self, groups: Vec<Vec<Article>>) -> Vec<StoryCluster> {
        let clusters = groups
            .into_iter()
            .filter_map(|group| {
                let mut items = self.classify_all(group);
                items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
                let mut items = items.into_iter();
                let mut cluster = StoryCluster::seed(items.next()?);
                items.for_each(|a| cluster.push(a));
                Some(cluster)
            })
            .collect();
        self.finish(clusters)
    }

    /// Computes blindspot flags and applies the diversity filter.
    pub fn finish(&self, mut clusters: Vec<StoryCluster>) -> Vec<StoryCluster> {
        clusters.iter_mut().for_each(StoryCluster::refresh_blindspot);
        self.diversity.filter(clusters)
    }

    fn classify_all(&self, articles: Vec<Article>) -> Vec<Article> {
        articles
            .into_iter()
            .map(|mut a| {
                a.bias = Some(self.classifier.classify(&a.source));
                a
            })
            .collect()
    }

    fn assign(&self, mut drafts: Vec<Draft>, article: Article) -> Vec<Draft> {
        let tokens = self.similarity.tokens(&article.title);
        let entities = self.similarity.entities(&article.title);

        let target = drafts.iter().position(|draft| {
            self.config
                .within_window(draft.cluster.first_published_at, article.published_at)
                && self.config.is_same_event(
                    draft.entities.intersection(&entities).count(),
                    jaccard_sets(&draft.tokens, &tokens),
                )
        });

        match target {
            Some(index) => self.attach(&mut drafts[index], article, tokens, entities),
            None => drafts.push(Draft::open(article, &self.similarity)),
        }
        drafts
    }

    fn attach(
        &self,
        draft: &mut Draft,
        article: Article,
        tokens: HashSet<String>,
        entities: HashSet<String>,
    ) {
        let marker = self.config.national_marker.as_str();
        let promote = !draft.cluster.main_title.contains(marker) && article.url.contains(marker);

        if promote {
            // The anchor follows the face of the cluster, not its earliest member.
            draft.cluster.main_title = article.title.clone();
            draft.cluster.summary = article.summary_text();
            draft.cluster.first_published_at = article.published_at;
            draft.tokens = tokens;
            draft.entities = entities;
        }
        draft.cluster.push(article);
    }
}
