//! Estado persistido do aprendizado entre execuções.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tipo das melhorias de regex instaladas pelo learner.
pub const REGEX_IMPROVEMENT: &str = "regex";

/// Resumo de um projeto processado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectInsight {
    /// Arquivos recebidos.
    pub file_count: usize,
    /// Instâncias encontradas por padrão.
    pub pattern_counts: BTreeMap<String, usize>,
    pub timestamp: DateTime<Utc>,
}

/// Melhoria instalada em um padrão.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternImprovement {
    #[serde(rename = "type")]
    pub kind: String,
    /// Regra textual anterior (vazia se não havia).
    pub original: String,
    pub improved: String,
    pub timestamp: DateTime<Utc>,
}

impl PatternImprovement {
    /// Melhoria do tipo generalização de regex.
    pub fn regex(original: impl Into<String>, improved: impl Into<String>) -> Self {
        Self {
            kind: REGEX_IMPROVEMENT.to_string(),
            original: original.into(),
            improved: improved.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Métricas acumuladas do learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearnerMetrics {
    pub projects_analyzed: u64,
    pub patterns_improved: u64,
    pub regex_improvements: u64,
    /// Taxa de sucesso de cada padrão antes da última melhoria.
    pub success_rate_before: BTreeMap<String, f64>,
    /// Taxa de sucesso de cada padrão logo após a última melhoria.
    pub success_rate_after: BTreeMap<String, f64>,
    pub last_update: DateTime<Utc>,
}

impl Default for LearnerMetrics {
    fn default() -> Self {
        Self {
            projects_analyzed: 0,
            patterns_improved: 0,
            regex_improvements: 0,
            success_rate_before: BTreeMap::new(),
            success_rate_after: BTreeMap::new(),
            last_update: Utc::now(),
        }
    }
}

/// Snapshot completo gravado pelo [`InsightsStore`](super::InsightsStore).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightsSnapshot {
    pub project_insights: BTreeMap<String, ProjectInsight>,
    pub pattern_improvements: BTreeMap<String, Vec<PatternImprovement>>,
    pub training_projects: BTreeSet<String>,
    pub pattern_variations: BTreeMap<String, Vec<String>>,
    pub metrics: LearnerMetrics,
    pub timestamp: Option<DateTime<Utc>>,
}

impl InsightsSnapshot {
    pub fn is_trained(&self, project_id: &str) -> bool {
        self.training_projects.contains(project_id)
    }

    /// Variações conhecidas de um padrão.
    pub fn variations(&self, pattern: &str) -> &[String] {
        self.pattern_variations
            .get(pattern)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Acrescenta variações novas (vazias e repetidas são ignoradas).
    ///
    /// Retorna quantas foram acrescentadas.
    pub fn add_variations<I>(&mut self, pattern: &str, variations: I) -> usize
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = 0;
        for variation in variations {
            if variation.is_empty() {
                continue;
            }
            let known = self.pattern_variations.entry(pattern.to_string()).or_default();
            if !known.contains(&variation) {
                known.push(variation);
                added += 1;
            }
        }
        added
    }

    pub fn total_variations(&self) -> usize {
        self.pattern_variations.values().map(Vec::len).sum()
    }

    pub fn total_improvements(&self) -> usize {
        self.pattern_improvements.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.training_projects.is_empty()
            && self.pattern_variations.is_empty()
            && self.pattern_improvements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_variations_dedupes() {
        let mut snapshot = InsightsSnapshot::default();

        let added = snapshot.add_variations(
            "getter",
            vec!["get_[a-zA-Z]+".to_string(), String::new(), "get_[a-zA-Z]+".to_string()],
        );

        assert_eq!(added, 1);
        assert_eq!(snapshot.variations("getter"), ["get_[a-zA-Z]+".to_string()]);
        assert!(snapshot.variations("other").is_empty());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut snapshot = InsightsSnapshot::default();
        snapshot.training_projects.insert("p1".to_string());
        snapshot
            .pattern_improvements
            .entry("getter".to_string())
            .or_default()
            .push(PatternImprovement::regex("", "get_[a-zA-Z]+"));

        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["training_projects"][0], "p1");
        assert_eq!(json["pattern_improvements"]["getter"][0]["type"], "regex");
        assert!(json["metrics"]["success_rate_before"].is_object());
    }

    #[test]
    fn test_missing_fields_default() {
        let snapshot: InsightsSnapshot =
            serde_json::from_str(r#"{"training_projects": ["a"]}"#).unwrap();

        assert!(snapshot.is_trained("a"));
        assert_eq!(snapshot.metrics.projects_analyzed, 0);
        assert!(!snapshot.is_empty());
    }
}
