//! Export/Import de variações aprendidas.
//!
//! Permite compartilhar conhecimento entre diferentes instalações.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::PadraoResult;

use super::insights::{InsightsSnapshot, LearnerMetrics, PatternImprovement};
use super::learner::CrossProjectLearner;

/// Versão do formato de exportação.
pub const EXPORT_VERSION: &str = "1.0";

/// Estrutura de exportação.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsExport {
    /// Versão do formato de exportação.
    pub version: String,
    /// Data/hora da exportação.
    pub exported_at: DateTime<Utc>,
    /// Variações por padrão.
    pub pattern_variations: BTreeMap<String, Vec<String>>,
    /// Histórico de melhorias (informativo; não é importado).
    #[serde(default)]
    pub pattern_improvements: BTreeMap<String, Vec<PatternImprovement>>,
    #[serde(default)]
    pub metrics: LearnerMetrics,
}

/// Resultado de uma importação.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportResult {
    /// Variações novas.
    pub imported: usize,
    /// Variações ignoradas (já existentes ou vazias).
    pub skipped: usize,
}

impl CrossProjectLearner {
    /// Exporta as variações e o histórico para um arquivo JSON.
    pub async fn export(&mut self, path: &Path) -> PadraoResult<InsightsExport> {
        self.initialize().await;

        let insights = self.insights();
        let export = InsightsExport {
            version: EXPORT_VERSION.to_string(),
            exported_at: Utc::now(),
            pattern_variations: insights.pattern_variations.clone(),
            pattern_improvements: insights.pattern_improvements.clone(),
            metrics: insights.metrics.clone(),
        };

        let json = serde_json::to_string_pretty(&export)?;
        tokio::fs::write(path, json).await?;

        tracing::info!(
            path = %path.display(),
            variations = insights.total_variations(),
            "Insights exported"
        );

        Ok(export)
    }

    /// Importa variações de um arquivo JSON e grava o estado.
    pub async fn import(&mut self, path: &Path) -> PadraoResult<ImportResult> {
        self.initialize().await;

        let json = tokio::fs::read_to_string(path).await?;
        let export: InsightsExport = serde_json::from_str(&json)?;

        let mut result = ImportResult::default();
        for (pattern, variations) in export.pattern_variations {
            let offered = variations.len();
            let added = self.merge_variations(&pattern, variations);
            result.imported += added;
            result.skipped += offered - added;
        }

        if result.imported > 0 {
            self.persist().await;
        }

        tracing::info!(
            path = %path.display(),
            version = %export.version,
            imported = result.imported,
            skipped = result.skipped,
            "Insights imported"
        );

        Ok(result)
    }
}

/// Formata o estado aprendido para exibição.
pub fn format_insights(snapshot: &InsightsSnapshot) -> String {
    let mut output = String::new();

    output.push_str("# Padrão Insights\n\n");

    output.push_str(&format!(
        "**Projects Analyzed:** {}\n",
        snapshot.metrics.projects_analyzed
    ));
    output.push_str(&format!(
        "**Patterns Improved:** {}\n",
        snapshot.metrics.patterns_improved
    ));
    output.push_str(&format!(
        "**Known Variations:** {}\n\n",
        snapshot.total_variations()
    ));

    if !snapshot.pattern_variations.is_empty() {
        output.push_str("## Variations\n\n");
        for (pattern, variations) in &snapshot.pattern_variations {
            output.push_str(&format!("### {}\n", pattern));
            for variation in variations {
                output.push_str(&format!("- `{}`\n", variation));
            }
            output.push('\n');
        }
    }

    if !snapshot.pattern_improvements.is_empty() {
        output.push_str("## Improvements\n\n");
        for (pattern, improvements) in &snapshot.pattern_improvements {
            for improvement in improvements {
                let original = if improvement.original.is_empty() {
                    "(none)"
                } else {
                    improvement.original.as_str()
                };
                output.push_str(&format!(
                    "- **{}** ({}): `{}` → `{}`\n",
                    pattern,
                    improvement.timestamp.format("%Y-%m-%d %H:%M"),
                    original,
                    improvement.improved
                ));
            }
        }
        output.push('\n');
    }

    if !snapshot.project_insights.is_empty() {
        output.push_str("## Projects\n\n");
        for (project, insight) in &snapshot.project_insights {
            let instances: usize = insight.pattern_counts.values().sum();
            output.push_str(&format!(
                "- **{}**: {} files, {} matches\n",
                project, insight.file_count, instances
            ));
        }
    }

    output
}
