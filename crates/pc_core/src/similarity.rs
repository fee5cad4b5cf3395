use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Generic capitalized words that never count as entities. Compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopList(HashSet<String>);

impl StopList {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(words.into_iter().map(|w| w.as_ref().to_lowercase()).collect())
    }

    pub fn empty() -> Self {
        Self(HashSet::new())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains(&word.to_lowercase())
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.0
            .extend(words.into_iter().map(|w| w.as_ref().to_lowercase()));
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for StopList {
    fn default() -> Self {
        Self::new([
            // places and scope words
            "México", "Chile", "Santiago", "Mundo", "País", "Nacional", "Internacional",
            // temporal and news boilerplate
            "Minuto", "Ahora", "Ultimo", "Noticias", "Gobierno",
            // capitalized function words at headline start
            "Para", "Como", "Este", "Esta", "Pero", "Porque", "Tiene", "Desde",
        ])
    }
}

/// Lexical headline similarity: token Jaccard plus capitalized-entity overlap.
#[derive(Debug, Clone, Default)]
pub struct SimilarityEngine {
    stop_list: StopList,
}

impl SimilarityEngine {
    pub fn new(stop_list: StopList) -> Self {
        Self { stop_list }
    }

    pub fn stop_list(&self) -> &StopList {
        &self.stop_list
    }

    /// Lower-cased, punctuation-free tokens longer than two characters.
    pub fn tokens(&self, text: &str) -> HashSet<String> {
        let cleaned: String = text
            .to_lowercase()
            .chars()
            .filter(|c| is_word_char(*c) || c.is_whitespace())
            .collect();
        cleaned
            .split_whitespace()
            .filter(|t| t.chars().count() > 2)
            .map(str::to_string)
            .collect()
    }

    pub fn jaccard(&self, a: &str, b: &str) -> f64 {
        jaccard_sets(&self.tokens(a), &self.tokens(b))
    }

    /// Capitalized tokens longer than three characters that are not generic words.
    pub fn entities(&self, text: &str) -> HashSet<String> {
        text.split_whitespace()
            .filter_map(|word| {
                let clean: String = word.chars().filter(|c| is_word_char(*c)).collect();
                let starts_upper = clean.chars().next().is_some_and(char::is_uppercase);
                if clean.chars().count() > 3 && starts_upper && !self.stop_list.contains(&clean) {
                    Some(clean.to_lowercase())
                } else {
                    None
                }
            })
            .collect()
    }

    pub fn shared_entities(&self, a: &str, b: &str) -> usize {
        self.entities(a).intersection(&self.entities(b)).count()
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

pub(crate) fn jaccard_sets(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_drop_short_words_and_punctuation() {
        let engine = SimilarityEngine::default();
        let tokens = engine.tokens("¡El Senado aprueba la ley, de pensiones!");
        let expected: HashSet<String> = ["senado", "aprueba", "ley", "pensiones"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(tokens, expected);
    }

    #[test]
    fn test_jaccard() {
        let engine = SimilarityEngine::default();
        assert_eq!(engine.jaccard("", ""), 0.0);
        assert_eq!(engine.jaccard("un de la", "el y"), 0.0);
        assert_eq!(engine.jaccard("Senado aprueba", "senado APRUEBA"), 1.0);

        let score = engine.jaccard(
            "Senado aprueba nueva ley de pensiones",
            "Oposición critica aprobación de ley de pensiones en el Senado",
        );
        assert!((score - 3.0 / 8.0).abs() < 1e-9, "score was {}", score);
    }

    #[test]
    fn test_entities() {
        let engine = SimilarityEngine::default();
        let entities = engine.entities("Oposición critica al Gobierno de Boric en Chile: «Kast» responde");
        let expected: HashSet<String> = ["oposición", "boric", "kast"]
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(entities, expected);
    }

    #[test]
    fn test_stop_list_is_case_insensitive() {
        let engine = SimilarityEngine::new(StopList::new(["SENADO"]));
        assert!(engine.entities("Senado vota hoy").is_empty());
        assert_eq!(engine.shared_entities("Ñuñoa elige alcalde", "Vecinos de Ñuñoa votan"), 1);
    }
}
