use std::fmt;
use std::sync::Arc;

use pc_core::{
    AnalysisKpis, Article, ClusterAnalysis, Error, InferenceModel, OutletAudit, Result,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::strip_fences;

const DIVERSITY_LEVELS: [&str; 3] = ["ALTA", "MEDIA", "BAJA"];

#[derive(Deserialize)]
struct RawAnalysis {
    resumen_ejecutivo: String,
    #[serde(default)]
    auditoria_lineal: Vec<RawAudit>,
    kpis: RawKpis,
}

#[derive(Deserialize)]
struct RawKpis {
    polarizacion: f32,
    diversidad: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawAudit {
    meta: RawMeta,
    analisis_especifico: RawReading,
    kpis: RawOutletKpis,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawMeta {
    sesgo: String,
    medio: String,
    titular: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawReading {
    framing: String,
    puntos_ciegos: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawOutletKpis {
    polarizacion: f32,
    neutralidad: f32,
    sensacionalismo: f32,
}

impl From<RawAudit> for OutletAudit {
    fn from(raw: RawAudit) -> Self {
        Self {
            outlet: raw.meta.medio,
            bias: raw.meta.sesgo,
            headline: raw.meta.titular,
            framing: raw.analisis_especifico.framing,
            blind_spots: raw.analisis_especifico.puntos_ciegos,
            polarization: raw.kpis.polarizacion,
            neutrality: raw.kpis.neutralidad,
            sensationalism: raw.kpis.sensacionalismo,
        }
    }
}

/// Executive summary and coverage KPIs for one cluster.
pub struct ClusterAnalyzer {
    model: Arc<dyn InferenceModel>,
}

impl fmt::Debug for ClusterAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterAnalyzer")
            .field("model", &self.model.name())
            .finish()
    }
}

impl ClusterAnalyzer {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    fn prompt(items: &[Article]) -> String {
        let listing = items
            .iter()
            .map(|a| {
                format!(
                    "- Fuente: {} ({})\n  Titular: {}\n  Resumen: {}",
                    a.source,
                    a.bias.map(|b| b.as_str()).unwrap_or("desconocido"),
                    a.title,
                    a.description.as_deref().unwrap_or_default()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "Actúa como auditor de datos y analista político experto en el ecosistema de medios chileno.\n\
             Recibes un grupo de artículos sobre un mismo evento. Expón las discrepancias y los puntos ciegos.\n\n\
             ARTÍCULOS:\n{}\n\n\
             FORMATO DE SALIDA (JSON estricto):\n\
             {{\n\
               \"resumen_ejecutivo\": \"...\",\n\
               \"auditoria_lineal\": [\n\
                 {{\n\
                   \"meta\": {{ \"sesgo\": \"...\", \"medio\": \"...\", \"titular\": \"...\" }},\n\
                   \"analisis_especifico\": {{ \"framing\": \"...\", \"puntos_ciegos\": \"...\" }},\n\
                   \"kpis\": {{ \"polarizacion\": 1, \"neutralidad\": 1, \"sensacionalismo\": 1 }}\n\
                 }}\n\
               ],\n\
               \"kpis\": {{ \"polarizacion\": 5.0, \"diversidad\": \"ALTA\" }}\n\
             }}\n\n\
             Retorna SOLO el JSON. Sin markdown.",
            listing
        )
    }

    pub fn parse(reply: &str) -> Result<ClusterAnalysis> {
        let raw: RawAnalysis = serde_json::from_str(strip_fences(reply))
            .map_err(|e| Error::Inference(format!("Malformed analysis: {}", e)))?;

        let diversity = raw.kpis.diversidad.trim().to_uppercase();
        if !DIVERSITY_LEVELS.contains(&diversity.as_str()) {
            return Err(Error::Inference(format!("Unknown diversity level: {}", diversity)));
        }
        if !raw.kpis.polarizacion.is_finite() {
            return Err(Error::Inference("Polarization is not a number".to_string()));
        }

        Ok(ClusterAnalysis {
            executive_summary: raw.resumen_ejecutivo.trim().to_string(),
            kpis: AnalysisKpis {
                polarization: raw.kpis.polarizacion.clamp(1.0, 10.0),
                diversity,
            },
            audit: raw.auditoria_lineal.into_iter().map(OutletAudit::from).collect(),
        })
    }

    /// `None` when the model fails or answers with something unusable.
    pub async fn analyze(&self, items: &[Article]) -> Option<ClusterAnalysis> {
        if items.is_empty() {
            return None;
        }
        match self.try_analyze(items).await {
            Ok(analysis) => {
                info!("🧠 Analysed cluster of {} items with {}", items.len(), self.model.name());
                Some(analysis)
            }
            Err(e) => {
                warn!("⚠️ Cluster analysis unavailable: {}", e);
                None
            }
        }
    }

    async fn try_analyze(&self, items: &[Article]) -> Result<ClusterAnalysis> {
        let reply = self.model.generate(&Self::prompt(items)).await?;
        Self::parse(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DummyModel;
    use chrono::Utc;
    use pc_core::BiasCategory;

    const REPLY: &str = r#"```json
    {
        "resumen_ejecutivo": "La derecha enfatiza costos, la izquierda cobertura.",
        "auditoria_lineal": [
            {
                "meta": {"sesgo": "right", "medio": "Emol", "titular": "Reforma encarece contratos"},
                "analisis_especifico": {"framing": "económico", "puntos_ciegos": "omite cobertura", "adjetivo_critico": "costosa"},
                "kpis": {"polarizacion": 6, "neutralidad": 4, "sensacionalismo": 3}
            }
        ],
        "kpis": {"polarizacion": 7.5, "diversidad": "media"}
    }
    ```"#;

    fn items() -> Vec<Article> {
        let mut a = Article::new("https://www.emol.com/a", "Reforma encarece contratos", "Emol", Utc::now());
        a.bias = Some(BiasCategory::Right);
        let b = Article::new("https://www.elmostrador.cl/b", "Reforma amplía cobertura", "El Mostrador", Utc::now());
        vec![a, b]
    }

    #[test]
    fn test_parse_maps_fields() {
        let analysis = ClusterAnalyzer::parse(REPLY).unwrap();
        assert_eq!(analysis.kpis.diversity, "MEDIA");
        assert_eq!(analysis.kpis.polarization, 7.5);
        assert_eq!(analysis.audit.len(), 1);
        assert_eq!(analysis.audit[0].outlet, "Emol");
        assert_eq!(analysis.audit[0].blind_spots, "omite cobertura");
    }

    #[test]
    fn test_parse_rejects_bad_kpis() {
        let bad_level = r#"{"resumen_ejecutivo": "x", "kpis": {"polarizacion": 3, "diversidad": "ENORME"}}"#;
        assert!(ClusterAnalyzer::parse(bad_level).is_err());

        let missing = r#"{"resumen_ejecutivo": "x"}"#;
        assert!(ClusterAnalyzer::parse(missing).is_err());

        let clamped = r#"{"resumen_ejecutivo": "x", "kpis": {"polarizacion": 42, "diversidad": "BAJA"}}"#;
        assert_eq!(ClusterAnalyzer::parse(clamped).unwrap().kpis.polarization, 10.0);
    }

    #[tokio::test]
    async fn test_analyze_degrades_to_none() {
        let good = ClusterAnalyzer::new(Arc::new(DummyModel::replying(REPLY)));
        assert!(good.analyze(&items()).await.is_some());

        let garbage = ClusterAnalyzer::new(Arc::new(DummyModel::replying("no sé")));
        assert!(garbage.analyze(&items()).await.is_none());

        let silent = ClusterAnalyzer::new(Arc::new(DummyModel::new(Vec::new())));
        assert!(silent.analyze(&items()).await.is_none());
        assert!(good.analyze(&[]).await.is_none());
    }

    #[test]
    fn test_prompt_includes_bias() {
        let prompt = ClusterAnalyzer::prompt(&items());
        assert!(prompt.contains("Fuente: Emol (right)"));
        assert!(prompt.contains("Fuente: El Mostrador (desconocido)"));
    }
}
