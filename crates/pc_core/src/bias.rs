use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::BiasCategory;

/// Substring fragments (and whole lower-cased names) that map to one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub category: BiasCategory,
    #[serde(default)]
    pub fragments: Vec<String>,
    #[serde(default)]
    pub names: Vec<String>,
}

impl KeywordRule {
    pub fn new(category: BiasCategory, fragments: &[&str]) -> Self {
        Self {
            category,
            fragments: fragments.iter().map(|f| f.to_lowercase()).collect(),
            names: Vec::new(),
        }
    }

    pub fn with_names(mut self, names: &[&str]) -> Self {
        self.names = names.iter().map(|n| n.to_lowercase()).collect();
        self
    }

    fn matches(&self, lower: &str) -> bool {
        self.names.iter().any(|n| n == lower)
            || self.fragments.iter().any(|f| lower.contains(f.as_str()))
    }
}

/// Publisher → bias lookup data. Rules are evaluated in order; first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasTable {
    #[serde(default)]
    pub publishers: HashMap<String, BiasCategory>,
    #[serde(default)]
    pub rules: Vec<KeywordRule>,
}

impl BiasTable {
    pub fn empty() -> Self {
        Self {
            publishers: HashMap::new(),
            rules: Vec::new(),
        }
    }

    pub fn with_publisher(mut self, name: &str, category: BiasCategory) -> Self {
        self.publishers.insert(name.to_string(), category);
        self
    }

    pub fn with_rule(mut self, rule: KeywordRule) -> Self {
        self.rules.push(rule);
        self
    }
}

impl Default for BiasTable {
    fn default() -> Self {
        use BiasCategory::*;

        let publishers = [
            ("El Mercurio", Right),
            ("Emol", Right),
            ("Radio Agricultura", Right),
            ("La Tercera", CenterRight),
            ("Meganoticias", CenterRight),
            ("T13", CenterRight),
            ("BioBioChile", Center),
            ("24horas.cl", Center),
            ("CNN Chile", Center),
            ("ADN Radio", Center),
            ("Cooperativa.cl", CenterLeft),
            ("El Mostrador", CenterLeft),
            ("El Desconcierto", Left),
            ("La Izquierda Diario", Left),
            ("El Ciudadano", Left),
            ("The Clinic", Left),
            ("Radio Universidad de Chile", Left),
            ("Interferencia", Left),
            ("CIPER", CenterLeft),
            ("RT", Left),
            ("Página/12", Left),
            ("El País", CenterLeft),
            ("Infobae", Right),
            ("Clarín", CenterRight),
            ("La Nación", Right),
            ("ABC", Right),
            ("El Mundo", Right),
        ]
        .into_iter()
        .map(|(name, category)| (name.to_string(), category))
        .collect();

        // Narrower lists go first: several fragments are substrings of other brands.
        let rules = vec![
            KeywordRule::new(
                Right,
                &[
                    "mercurio", "emol", "agricultura", "infobae", "lanacion", "abc", "foxnews",
                    "wsj", "nypost", "elmundo",
                ],
            ),
            KeywordRule::new(
                CenterRight,
                &["tercera", "meganoticias", "t13", "clarin", "lavanguardia"],
            ),
            KeywordRule::new(
                Left,
                &[
                    "desconcierto", "izquierda", "ciudadano", "pagina12", "rt.com", "guardian",
                    "clinic",
                ],
            )
            .with_names(&["rt"]),
            KeywordRule::new(
                CenterLeft,
                &[
                    "mostrador", "cooperativa", "uchile", "interferencia", "ciper", "elpais",
                    "nytimes", "aljazeera",
                ],
            ),
        ];

        Self { publishers, rules }
    }
}

/// Maps a publisher identifier (display name, domain or slug) to a bias category.
#[derive(Debug, Clone, Default)]
pub struct BiasClassifier {
    table: BiasTable,
}

impl BiasClassifier {
    pub fn new(table: BiasTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &BiasTable {
        &self.table
    }

    /// Never fails: anything unrecognized is `center`.
    pub fn classify(&self, source: &str) -> BiasCategory {
        let name = source.trim();
        if let Some(category) = self.table.publishers.get(name) {
            return *category;
        }

        let lower = name.to_lowercase();
        self.table
            .rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map(|rule| rule.category)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use BiasCategory::*;

    #[test]
    fn test_exact_publisher_names() {
        let classifier = BiasClassifier::default();
        assert_eq!(classifier.classify("El Mostrador"), CenterLeft);
        assert_eq!(classifier.classify("  BioBioChile "), Center);
        assert_eq!(classifier.classify("Clarín"), CenterRight);
    }

    #[test]
    fn test_domain_fragments() {
        let classifier = BiasClassifier::default();
        assert_eq!(classifier.classify("latercera.com"), CenterRight);
        assert_eq!(classifier.classify("elmostrador.cl"), CenterLeft);
        assert_eq!(classifier.classify("emol.com"), Right);
        assert_eq!(classifier.classify("t13.cl"), CenterRight);
        assert_eq!(classifier.classify("theclinic.cl"), Left);
        assert_eq!(classifier.classify("RT"), Left);
    }

    #[test]
    fn test_unknown_is_center() {
        let classifier = BiasClassifier::default();
        assert_eq!(classifier.classify("biobiochile.cl"), Center);
        assert_eq!(classifier.classify(""), Center);
        assert_eq!(classifier.classify("Some Blog"), Center);
    }

    #[test]
    fn test_rule_order_decides_overlaps() {
        // "abc" (right) also appears inside brands that mention "tercera"
        let classifier = BiasClassifier::default();
        assert_eq!(classifier.classify("abc-tercera"), Right);

        let reversed = BiasTable::empty()
            .with_rule(KeywordRule::new(CenterRight, &["tercera"]))
            .with_rule(KeywordRule::new(Right, &["abc"]));
        assert_eq!(BiasClassifier::new(reversed).classify("abc-tercera"), CenterRight);
    }

    #[test]
    fn test_injected_minimal_table() {
        let table = BiasTable::empty().with_publisher("Diario Uno", Left);
        let classifier = BiasClassifier::new(table);
        assert_eq!(classifier.classify("Diario Uno"), Left);
        assert_eq!(classifier.classify("emol.com"), Center);
    }
}
