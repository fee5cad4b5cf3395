use serde::{Deserialize, Serialize};

const CHILE_LEFT: &[&str] = &[
    "elmostrador.cl", "eldesconcierto.cl", "theclinic.cl", "elciudadano.com",
    "laizquierdadiario.cl", "cooperativa.cl", "cnnchile.com", "radio.uchile.cl",
    "interferencia.cl", "ciperchile.cl",
];

const CHILE_RIGHT_CENTER: &[&str] = &[
    "latercera.com", "biobiochile.cl", "emol.com", "24horas.cl", "t13.cl",
    "radioagricultura.cl", "adnradio.cl", "meganoticias.cl",
];

const INTL_LEFT: &[&str] = &["elpais.com", "rt.com", "pagina12.com.ar", "eldiario.es"];

const INTL_RIGHT_CENTER: &[&str] = &[
    "infobae.com", "clarin.com", "lanacion.com.ar", "elmundo.es", "lavanguardia.com", "abc.es",
    "cnn.com", "bbc.com", "dw.com",
];

const ANGLO_LEFT: &[&str] = &[
    "nytimes.com", "cnn.com", "theguardian.com", "washingtonpost.com", "aljazeera.com",
    "msnbc.com",
];

const ANGLO_RIGHT_CENTER: &[&str] = &[
    "foxnews.com", "bbc.co.uk", "reuters.com", "apnews.com", "usatoday.com", "bloomberg.com",
    "wsj.com", "nypost.com",
];

/// A topical/geographic acquisition profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeProfile {
    pub id: String,
    pub language: String,
    pub left_domains: Vec<String>,
    pub right_domains: Vec<String>,
    /// Single-country filter for providers that take one (`cl` for the national scope).
    #[serde(default)]
    pub country: Option<String>,
    /// Country list for providers that filter by source origin.
    #[serde(default)]
    pub source_countries: Vec<String>,
    /// Search text used when a provider requires one and the request has none.
    pub default_text: String,
}

impl ScopeProfile {
    fn build(id: &str, language: &str, left: &[&[&str]], right: &[&[&str]]) -> Self {
        let flatten = |lists: &[&[&str]]| {
            lists
                .iter()
                .flat_map(|l| l.iter().map(|d| d.to_string()))
                .collect::<Vec<_>>()
        };
        Self {
            id: id.to_string(),
            language: language.to_string(),
            left_domains: flatten(left),
            right_domains: flatten(right),
            country: None,
            source_countries: Vec::new(),
            default_text: "noticias".to_string(),
        }
    }

    /// True when the profile has both sides to query separately.
    pub fn has_split(&self) -> bool {
        !self.left_domains.is_empty() && !self.right_domains.is_empty()
    }

    pub fn all_domains(&self) -> Vec<String> {
        self.left_domains
            .iter()
            .chain(self.right_domains.iter())
            .cloned()
            .collect()
    }

    /// Restricts the profile to a single outlet: no split, one domain.
    pub fn restricted_to(&self, domain: &str) -> Self {
        Self {
            left_domains: vec![domain.to_string()],
            right_domains: Vec::new(),
            ..self.clone()
        }
    }

    pub fn defaults() -> Vec<ScopeProfile> {
        let nacional = ScopeProfile {
            country: Some("cl".to_string()),
            source_countries: vec!["cl".to_string()],
            default_text: "chile".to_string(),
            ..Self::build("nacional", "es", &[CHILE_LEFT], &[CHILE_RIGHT_CENTER])
        };
        let espanol = ScopeProfile {
            source_countries: ["cl", "ar", "es", "co", "mx", "pe"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            ..Self::build(
                "espanol",
                "es",
                &[CHILE_LEFT, INTL_LEFT],
                &[CHILE_RIGHT_CENTER, INTL_RIGHT_CENTER],
            )
        };
        let internacional = ScopeProfile {
            default_text: "world".to_string(),
            ..Self::build("internacional", "es", &[INTL_LEFT], &[INTL_RIGHT_CENTER])
        };
        let anglo = ScopeProfile {
            source_countries: vec!["us".to_string(), "gb".to_string()],
            default_text: "world".to_string(),
            ..Self::build("anglo", "en", &[ANGLO_LEFT], &[ANGLO_RIGHT_CENTER])
        };
        vec![nacional, espanol, internacional, anglo]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profiles() {
        let scopes = ScopeProfile::defaults();
        let ids: Vec<&str> = scopes.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["nacional", "espanol", "internacional", "anglo"]);

        let espanol = &scopes[1];
        assert!(espanol.left_domains.contains(&"elmostrador.cl".to_string()));
        assert!(espanol.left_domains.contains(&"elpais.com".to_string()));
        assert!(espanol.country.is_none());

        assert_eq!(scopes[3].language, "en");
        assert!(scopes.iter().all(ScopeProfile::has_split));
    }

    #[test]
    fn test_restricted_profile_has_no_split() {
        let nacional = &ScopeProfile::defaults()[0];
        let single = nacional.restricted_to("emol.com");
        assert!(!single.has_split());
        assert_eq!(single.all_domains(), vec!["emol.com".to_string()]);
        assert_eq!(single.country.as_deref(), Some("cl"));
    }
}
