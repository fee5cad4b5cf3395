use chrono::{DateTime, Duration, TimeZone, Utc};
use pc_core::{dedupe, Article, ClusteringEngine, DiversityFilter, StoryCluster};
use proptest::prelude::*;

const WORDS: &[&str] = &[
    "Boric", "Kast", "Senado", "pensiones", "ley", "Temuco", "incendio", "Valparaíso", "reforma",
    "aprueba", "critica", "Coquimbo", "Matthei", "Cámara", "tributaria",
];

const SOURCES: &[&str] = &[
    "emol.com", "elmostrador.cl", "t13.cl", "latercera.com", "theclinic.cl", "biobiochile.cl",
    "El País", "Some Blog",
];

fn base() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()
}

fn article_strategy() -> impl Strategy<Value = Article> {
    (
        0..25usize,
        prop::collection::vec(prop::sample::select(WORDS), 2..7),
        prop::sample::select(SOURCES),
        0i64..96,
        prop::bool::ANY,
    )
        .prop_map(|(id, words, source, hours, national)| {
            let host = if national { "diario.cl" } else { "diario.com" };
            Article::new(
                format!("https://{}/{}", host, id),
                words.join(" "),
                source,
                base() + Duration::hours(hours),
            )
        })
}

fn membership(clusters: &[StoryCluster]) -> Vec<Vec<String>> {
    clusters
        .iter()
        .map(|c| c.items.iter().map(|a| a.url.clone()).collect())
        .collect()
}

proptest! {
    #[test]
    fn clustering_is_deterministic(articles in prop::collection::vec(article_strategy(), 0..40)) {
        let engine = ClusteringEngine::default();
        let articles = dedupe(articles);
        let first = engine.cluster(articles.clone());
        let second = engine.cluster(articles);
        prop_assert_eq!(membership(&first), membership(&second));
        let keys: Vec<String> = first.iter().map(StoryCluster::content_key).collect();
        let again: Vec<String> = second.iter().map(StoryCluster::content_key).collect();
        prop_assert_eq!(keys, again);
    }

    #[test]
    fn dedupe_is_idempotent(articles in prop::collection::vec(article_strategy(), 0..40)) {
        let once = dedupe(articles);
        let twice = dedupe(once.clone());
        prop_assert_eq!(&once, &twice);

        let mut urls: Vec<&str> = once.iter().map(|a| a.url.as_str()).collect();
        let len = urls.len();
        urls.sort_unstable();
        urls.dedup();
        prop_assert_eq!(urls.len(), len);
    }

    #[test]
    fn bias_counts_cover_every_item(articles in prop::collection::vec(article_strategy(), 0..40)) {
        let engine = ClusteringEngine::default();
        let partition = engine.partition(dedupe(articles));
        for cluster in &partition {
            prop_assert!(!cluster.items.is_empty());
            prop_assert_eq!(cluster.bias_distribution.total(), cluster.items.len());
        }
    }

    #[test]
    fn blindspots_are_one_sided(articles in prop::collection::vec(article_strategy(), 0..40)) {
        let engine = ClusteringEngine::default();
        let clusters = engine.finish(engine.partition(dedupe(articles)));
        for cluster in &clusters {
            let left = cluster.bias_distribution.left_block();
            let right = cluster.bias_distribution.right_block();
            if cluster.blindspot {
                prop_assert!((left > 0) != (right > 0));
                prop_assert!(cluster.blindspot_side.is_some());
            } else {
                prop_assert!(cluster.blindspot_side.is_none());
                prop_assert!((left > 0) == (right > 0));
            }
        }
    }

    #[test]
    fn diversity_filter_only_removes(articles in prop::collection::vec(article_strategy(), 0..40)) {
        let engine = ClusteringEngine::default();
        let partition = engine.partition(dedupe(articles));
        let kept = DiversityFilter::default().filter(partition.clone());
        prop_assert!(kept.len() <= partition.len());

        let all_ids: Vec<&str> = partition.iter().map(|c| c.id.as_str()).collect();
        let kept_ids: Vec<&str> = kept.iter().map(|c| c.id.as_str()).collect();
        let mut cursor = all_ids.iter();
        for id in kept_ids {
            // order-preserving subsequence
            prop_assert!(cursor.any(|candidate| *candidate == id));
        }
    }
}
