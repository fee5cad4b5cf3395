use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

use crate::Error;

/// A normalized news item as produced by a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub url: String,
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bias: Option<BiasCategory>,
}

impl Article {
    pub fn new(
        url: impl Into<String>,
        title: impl Into<String>,
        source: impl Into<String>,
        published_at: DateTime<Utc>,
    ) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            source: source.into(),
            published_at,
            description: None,
            image_url: None,
            bias: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Description when present and non-blank, title otherwise.
    pub fn summary_text(&self) -> String {
        match self.description.as_deref().map(str::trim) {
            Some(d) if !d.is_empty() => d.to_string(),
            _ => self.title.clone(),
        }
    }
}

/// Editorial bias on a single left-right axis.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum BiasCategory {
    Left,
    CenterLeft,
    #[default]
    Center,
    CenterRight,
    Right,
}

impl BiasCategory {
    pub const ALL: [BiasCategory; 5] = [
        BiasCategory::Left,
        BiasCategory::CenterLeft,
        BiasCategory::Center,
        BiasCategory::CenterRight,
        BiasCategory::Right,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BiasCategory::Left => "left",
            BiasCategory::CenterLeft => "center-left",
            BiasCategory::Center => "center",
            BiasCategory::CenterRight => "center-right",
            BiasCategory::Right => "right",
        }
    }
}

impl fmt::Display for BiasCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BiasCategory {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        BiasCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| Error::Config(format!("Unknown bias category: {}", s)))
    }
}

/// The side of the axis that has no coverage in a blindspot cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlindspotSide {
    Left,
    Right,
}

/// Per-category article counts. All five keys are always serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasDistribution {
    pub left: usize,
    #[serde(rename = "center-left")]
    pub center_left: usize,
    pub center: usize,
    #[serde(rename = "center-right")]
    pub center_right: usize,
    pub right: usize,
}

impl BiasDistribution {
    pub fn get(&self, category: BiasCategory) -> usize {
        match category {
            BiasCategory::Left => self.left,
            BiasCategory::CenterLeft => self.center_left,
            BiasCategory::Center => self.center,
            BiasCategory::CenterRight => self.center_right,
            BiasCategory::Right => self.right,
        }
    }

    pub fn increment(&mut self, category: BiasCategory) {
        let slot = match category {
            BiasCategory::Left => &mut self.left,
            BiasCategory::CenterLeft => &mut self.center_left,
            BiasCategory::Center => &mut self.center,
            BiasCategory::CenterRight => &mut self.center_right,
            BiasCategory::Right => &mut self.right,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        BiasCategory::ALL.iter().map(|c| self.get(*c)).sum()
    }

    /// Number of categories with at least one article.
    pub fn distinct(&self) -> usize {
        BiasCategory::ALL.iter().filter(|c| self.get(**c) > 0).count()
    }

    pub fn left_block(&self) -> usize {
        self.left + self.center_left
    }

    pub fn right_block(&self) -> usize {
        self.right + self.center_right
    }

    /// Side missing from coverage, if exactly one block is present.
    pub fn blindspot(&self) -> Option<BlindspotSide> {
        match (self.left_block(), self.right_block()) {
            (l, 0) if l > 0 => Some(BlindspotSide::Right),
            (0, r) if r > 0 => Some(BlindspotSide::Left),
            _ => None,
        }
    }
}

/// A set of articles believed to report the same event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryCluster {
    pub id: String,
    pub main_title: String,
    pub summary: String,
    pub items: Vec<Article>,
    pub bias_distribution: BiasDistribution,
    pub first_published_at: DateTime<Utc>,
    #[serde(default)]
    pub blindspot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blindspot_side: Option<BlindspotSide>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<ClusterAnalysis>,
}

impl StoryCluster {
    /// Opens a one-article cluster anchored at the article's publish time.
    pub fn seed(article: Article) -> Self {
        let mut cluster = Self {
            id: Uuid::new_v4().to_string(),
            main_title: article.title.clone(),
            summary: article.summary_text(),
            items: Vec::new(),
            bias_distribution: BiasDistribution::default(),
            first_published_at: article.published_at,
            blindspot: false,
            blindspot_side: None,
            analysis: None,
        };
        cluster.push(article);
        cluster
    }

    /// Appends an article and counts its bias. Unclassified articles count as `center`.
    pub fn push(&mut self, article: Article) {
        self.bias_distribution
            .increment(article.bias.unwrap_or_default());
        self.items.push(article);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn refresh_blindspot(&mut self) {
        self.blindspot_side = self.bias_distribution.blindspot();
        self.blindspot = self.blindspot_side.is_some();
    }

    /// Stable cache key over the member URL set, independent of order and id.
    pub fn content_key(&self) -> String {
        content_key(self.items.iter().map(|a| a.url.as_str()))
    }
}

/// SHA-256 hex digest of the sorted, comma-joined URLs.
pub fn content_key<'a>(urls: impl IntoIterator<Item = &'a str>) -> String {
    let mut urls: Vec<&str> = urls.into_iter().collect();
    urls.sort_unstable();
    let digest = Sha256::digest(urls.join(",").as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Natural-language read of a cluster produced by an inference model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAnalysis {
    pub executive_summary: String,
    pub kpis: AnalysisKpis,
    /// Per-outlet reading, one entry per item the model chose to audit
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit: Vec<OutletAudit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisKpis {
    pub polarization: f32,
    pub diversity: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutletAudit {
    pub outlet: String,
    pub bias: String,
    pub headline: String,
    pub framing: String,
    pub blind_spots: String,
    pub polarization: f32,
    pub neutrality: f32,
    pub sensationalism: f32,
}

/// Output of one scope in a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Digest {
    pub scope: String,
    pub date: NaiveDate,
    pub clusters: Vec<StoryCluster>,
    pub raw_article_count: usize,
    pub cluster_count: usize,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(url: &str, bias: BiasCategory) -> Article {
        let mut a = Article::new(url, "Titular", "fuente", Utc::now());
        a.bias = Some(bias);
        a
    }

    #[test]
    fn test_distribution_serializes_all_keys() {
        let json = serde_json::to_value(BiasDistribution::default()).unwrap();
        for category in BiasCategory::ALL {
            assert_eq!(json[category.as_str()], 0);
        }
    }

    #[test]
    fn test_blindspot_sides() {
        let mut dist = BiasDistribution::default();
        assert_eq!(dist.blindspot(), None);
        dist.increment(BiasCategory::Center);
        assert_eq!(dist.blindspot(), None);
        dist.increment(BiasCategory::CenterLeft);
        assert_eq!(dist.blindspot(), Some(BlindspotSide::Right));
        dist.increment(BiasCategory::Right);
        assert_eq!(dist.blindspot(), None);

        let mut dist = BiasDistribution::default();
        dist.increment(BiasCategory::CenterRight);
        assert_eq!(dist.blindspot(), Some(BlindspotSide::Left));
    }

    #[test]
    fn test_content_key_ignores_order() {
        let mut a = StoryCluster::seed(article("https://a.cl/1", BiasCategory::Left));
        a.push(article("https://b.cl/2", BiasCategory::Right));
        let mut b = StoryCluster::seed(article("https://b.cl/2", BiasCategory::Right));
        b.push(article("https://a.cl/1", BiasCategory::Left));

        assert_ne!(a.id, b.id);
        assert_eq!(a.content_key(), b.content_key());
        assert_eq!(a.content_key().len(), 64);
    }

    #[test]
    fn test_summary_falls_back_to_title() {
        let a = Article::new("u", "Titular", "s", Utc::now()).with_description("  ");
        assert_eq!(a.summary_text(), "Titular");
    }

    #[test]
    fn test_bias_category_order_and_parse() {
        assert!(BiasCategory::Left < BiasCategory::CenterLeft);
        assert!(BiasCategory::CenterRight < BiasCategory::Right);
        assert_eq!("center-right".parse::<BiasCategory>().unwrap(), BiasCategory::CenterRight);
        assert!("middle".parse::<BiasCategory>().is_err());
    }
}
