use crate::types::StoryCluster;

/// Decides which clusters are worth surfacing.
#[derive(Debug, Clone, Copy)]
pub struct DiversityFilter {
    pub min_items: usize,
    pub min_distinct_biases: usize,
    pub min_items_single_block: usize,
}

impl Default for DiversityFilter {
    fn default() -> Self {
        Self {
            min_items: 2,
            min_distinct_biases: 2,
            min_items_single_block: 4,
        }
    }
}

impl DiversityFilter {
    /// Enough articles, and either a bias spread or a large one-sided story.
    pub fn retains(&self, cluster: &StoryCluster) -> bool {
        let len = cluster.items.len();
        len >= self.min_items
            && (cluster.bias_distribution.distinct() >= self.min_distinct_biases
                || len >= self.min_items_single_block)
    }

    pub fn filter(&self, clusters: Vec<StoryCluster>) -> Vec<StoryCluster> {
        clusters.into_iter().filter(|c| self.retains(c)).collect()
    }
}
