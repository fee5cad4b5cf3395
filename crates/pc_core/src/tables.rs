use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bias::BiasTable;
use crate::scope::ScopeProfile;
use crate::similarity::StopList;
use crate::{Error, Result};

/// Curated data the engine runs on. Every field can be overridden from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Tables {
    pub bias: BiasTable,
    pub stop_list: StopList,
    pub scopes: Vec<ScopeProfile>,
    /// Category name → boolean keyword query.
    pub categories: BTreeMap<String, String>,
}

impl Default for Tables {
    fn default() -> Self {
        let categories = [
            ("general", ""),
            ("politica", "(politica OR gobierno OR congreso OR boric OR senado OR diputados OR constitucion OR ministro)"),
            ("economia", "(economia OR inflacion OR dolar OR ipc OR banco central OR hacienda OR mercado)"),
            ("deportes", "(futbol OR deporte OR colo-colo OR u de chile OR alexis OR vidal OR garin OR panamericanos)"),
            ("tecnologia", "(tecnologia OR inteligencia artificial OR ciencia OR nasa OR celular OR app OR software)"),
            ("salud", "(salud OR minsal OR virus OR vacuna OR hospital OR medico)"),
            ("cultura", "(cultura OR arte OR musica OR cine OR libro OR concierto)"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            bias: BiasTable::default(),
            stop_list: StopList::default(),
            scopes: ScopeProfile::defaults(),
            categories,
        }
    }
}

impl Tables {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tables = Self::from_json(&std::fs::read_to_string(path)?)?;
        info!(
            "📚 Loaded tables from {} ({} publishers, {} stop words, {} scopes)",
            path.display(),
            tables.bias.publishers.len(),
            tables.stop_list.len(),
            tables.scopes.len()
        );
        Ok(tables)
    }

    pub fn scope(&self, id: &str) -> Result<&ScopeProfile> {
        self.scopes
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| Error::Config(format!("Unknown scope: {}", id)))
    }

    /// Keyword query for a category; `None` for unknown or catch-all categories.
    pub fn category_query(&self, category: &str) -> Option<&str> {
        self.categories
            .get(category)
            .map(String::as_str)
            .filter(|q| !q.is_empty())
    }
}
