use std::collections::HashSet;

use tracing::debug;

use crate::types::Article;

/// Title some providers return for withdrawn content.
pub const REMOVED_SENTINEL: &str = "[Removed]";

/// Drops articles that cannot enter clustering and trims publisher suffixes from titles.
pub fn normalize(articles: Vec<Article>) -> Vec<Article> {
    let before = articles.len();
    let normalized: Vec<Article> = articles
        .into_iter()
        .map(|mut a| {
            a.title = clean_title(&a.title);
            a
        })
        .filter(|a| {
            !a.url.trim().is_empty()
                && !a.title.is_empty()
                && !a.source.trim().is_empty()
                && a.title != REMOVED_SENTINEL
        })
        .collect();
    if normalized.len() != before {
        debug!("🧹 Dropped {} invalid articles", before - normalized.len());
    }
    normalized
}

/// `"Headline - Publisher"` → `"Headline"`.
pub fn clean_title(title: &str) -> String {
    title
        .split(" - ")
        .next()
        .unwrap_or(title)
        .trim()
        .to_string()
}

/// Keeps the first article seen for each URL, preserving input order.
pub fn dedupe(articles: Vec<Article>) -> Vec<Article> {
    let mut seen = HashSet::new();
    articles
        .into_iter()
        .filter(|a| {
            debug_assert!(!a.url.is_empty(), "article without url reached dedupe: {:?}", a.title);
            !a.url.is_empty() && seen.insert(a.url.clone())
        })
        .collect()
}

/// `normalize` followed by `dedupe`.
pub fn prepare(articles: Vec<Article>) -> Vec<Article> {
    dedupe(normalize(articles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(url: &str, title: &str, source: &str) -> Article {
        Article::new(url, title, source, Utc::now())
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let articles = vec![
            article("https://a.cl/1", "Primero", "a"),
            article("https://b.cl/1", "Otro", "b"),
            article("https://a.cl/1", "Segundo", "a"),
        ];
        let deduped = dedupe(articles);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].title, "Primero");
        assert_eq!(deduped[1].url, "https://b.cl/1");
    }

    #[test]
    fn test_normalize_drops_invalid() {
        let articles = vec![
            article("https://a.cl/1", "[Removed]", "a"),
            article("https://a.cl/2", "", "a"),
            article("https://a.cl/3", "Titular", " "),
            article("", "Sin url", "a"),
            article("https://a.cl/4", "Valido - La Tercera", "La Tercera"),
            article("https://a.cl/5", " - La Tercera", "La Tercera"),
            article("https://a.cl/6", "[Removed] - Emol", "Emol"),
        ];
        let normalized = normalize(articles);
        assert_eq!(normalized.len(), 1);
        assert_eq!(normalized[0].title, "Valido");
    }

    #[test]
    fn test_clean_title_keeps_plain_hyphens() {
        assert_eq!(clean_title("Covid-19 rebrota en Arica"), "Covid-19 rebrota en Arica");
        assert_eq!(clean_title("Boric viaja - Emol - Chile"), "Boric viaja");
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "article without url")]
    fn test_empty_url_asserts_in_debug() {
        dedupe(vec![article("", "Sin url", "a")]);
    }
}
