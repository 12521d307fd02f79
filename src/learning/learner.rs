//! Learner entre projetos.
//!
//! Ciclo por padrão: sem variações → coletando instâncias → variação
//! generalizada proposta → fundida na regra ativa.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::blocks::BlockExtractor;
use crate::hooks::{HookContext, HookSystem};
use crate::patterns::QueryPattern;
use crate::types::config::LearningConfig;
use crate::types::language::{language_applies, language_from_path};
use crate::types::{ParserKind, PatternContext};
use crate::PadraoResult;

use super::generalize::{generate_regex_from_examples, merge_rules, select_best_variation, MAX_EXAMPLES};
use super::insights::{InsightsSnapshot, PatternImprovement, ProjectInsight};
use super::similarity::{group_by_content, SimilarityThresholds};
use super::store::InsightsStore;

/// Nome do learner nos eventos de hooks e no quadro de saúde.
pub const LEARNER_COMPONENT: &str = "learner";

/// Arquivo de um projeto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Match limpo, guardado para agrupamento.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedInstance {
    pub pattern_name: String,
    pub language_id: String,
    pub file_path: String,
    pub text: String,
    pub groups: Vec<Option<String>>,
    pub named_groups: BTreeMap<String, String>,
}

/// Resultado de `learn_from_project`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LearnReport {
    pub project_id: String,
    pub file_count: usize,
    pub pattern_counts: BTreeMap<String, usize>,
    /// Variações novas acrescentadas ao estado.
    pub new_variations: usize,
    /// Projeto já aprendido antes; nada foi feito.
    pub skipped: bool,
}

/// Parâmetros de agrupamento e generalização.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearnerSettings {
    pub thresholds: SimilarityThresholds,
    pub min_group_size: usize,
    pub max_examples: usize,
    pub use_blocks: bool,
}

impl Default for LearnerSettings {
    fn default() -> Self {
        Self {
            thresholds: SimilarityThresholds::default(),
            min_group_size: 2,
            max_examples: MAX_EXAMPLES,
            use_blocks: false,
        }
    }
}

impl From<&LearningConfig> for LearnerSettings {
    fn from(config: &LearningConfig) -> Self {
        Self {
            thresholds: SimilarityThresholds::from(config),
            min_group_size: config.min_group_size,
            max_examples: config.max_examples,
            use_blocks: config.use_blocks,
        }
    }
}

/// Aprende variações de regra observando matches em vários projetos.
pub struct CrossProjectLearner {
    patterns: Vec<Box<dyn QueryPattern>>,
    store: Arc<dyn InsightsStore>,
    hooks: Option<Arc<HookSystem>>,
    block_extractor: Option<Arc<dyn BlockExtractor>>,
    settings: LearnerSettings,
    insights: InsightsSnapshot,
    initialized: bool,
}

impl CrossProjectLearner {
    pub fn new(patterns: Vec<Box<dyn QueryPattern>>, store: Arc<dyn InsightsStore>) -> Self {
        Self {
            patterns,
            store,
            hooks: None,
            block_extractor: None,
            settings: LearnerSettings::default(),
            insights: InsightsSnapshot::default(),
            initialized: false,
        }
    }

    pub fn with_settings(mut self, settings: LearnerSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<HookSystem>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Extrator usado quando `use_blocks` está ligado.
    pub fn with_block_extractor(mut self, extractor: Arc<dyn BlockExtractor>) -> Self {
        self.block_extractor = Some(extractor);
        self
    }

    pub fn patterns(&self) -> &[Box<dyn QueryPattern>] {
        &self.patterns
    }

    pub fn pattern(&self, name: &str) -> Option<&dyn QueryPattern> {
        self.patterns
            .iter()
            .find(|p| p.name() == name)
            .map(|p| p.as_ref())
    }

    pub fn pattern_mut(&mut self, name: &str) -> Option<&mut Box<dyn QueryPattern>> {
        self.patterns.iter_mut().find(|p| p.name() == name)
    }

    pub fn insights(&self) -> &InsightsSnapshot {
        &self.insights
    }

    pub fn store(&self) -> &Arc<dyn InsightsStore> {
        &self.store
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Carrega o snapshot uma única vez. Falhas de leitura começam do zero.
    pub async fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        match self.store.load().await {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    store = %self.store.describe(),
                    projects = snapshot.training_projects.len(),
                    variations = snapshot.total_variations(),
                    improvements = snapshot.total_improvements(),
                    "Insights loaded"
                );
                self.insights = snapshot;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(store = %self.store.describe(), error = %e, "Could not load insights");
            }
        }

        self.initialized = true;
        self.restore_improvements();
        self.offer_known_variations();

        tracing::info!(
            patterns = self.patterns.len(),
            projects_analyzed = self.insights.metrics.projects_analyzed,
            "Learner initialized"
        );
    }

    /// Reinstala as melhorias gravadas, em ordem, enquanto a regra viva for a
    /// regra de origem de cada uma. Regras editadas depois ficam como estão.
    fn restore_improvements(&mut self) {
        for pattern in self.patterns.iter_mut() {
            let Some(log) = self.insights.pattern_improvements.get(pattern.name()) else {
                continue;
            };

            for improvement in log {
                if pattern.base().text_rule() != improvement.original {
                    continue;
                }
                if let Err(e) = pattern.base_mut().install_text_rule(&improvement.improved) {
                    tracing::warn!(pattern = %pattern.name(), error = %e, "Could not restore improvement");
                    break;
                }
            }
        }
    }

    /// Aprende com um projeto. Idempotente por `project_id`.
    pub async fn learn_from_project(&mut self, project_id: &str, files: &[SourceFile]) -> LearnReport {
        self.initialize().await;

        if self.insights.is_trained(project_id) {
            tracing::debug!(project_id = %project_id, "Project already learned, skipping");
            return LearnReport {
                project_id: project_id.to_string(),
                file_count: files.len(),
                skipped: true,
                ..LearnReport::default()
            };
        }

        let instances = self.extract_instances(files).await;
        let pattern_counts: BTreeMap<String, usize> = instances
            .iter()
            .map(|(name, found)| (name.clone(), found.len()))
            .collect();

        self.insights.project_insights.insert(
            project_id.to_string(),
            ProjectInsight {
                file_count: files.len(),
                pattern_counts: pattern_counts.clone(),
                timestamp: Utc::now(),
            },
        );

        let mut new_variations = 0;
        for (name, found) in &instances {
            let variations = self.derive_variations(found);
            new_variations += self.insights.add_variations(name, variations);
        }
        self.offer_known_variations();

        self.insights.training_projects.insert(project_id.to_string());
        self.insights.metrics.projects_analyzed += 1;
        self.insights.metrics.last_update = Utc::now();
        self.persist().await;

        let report = LearnReport {
            project_id: project_id.to_string(),
            file_count: files.len(),
            pattern_counts,
            new_variations,
            skipped: false,
        };

        tracing::info!(
            project_id = %project_id,
            file_count = files.len(),
            patterns_found = report.pattern_counts.len(),
            new_variations,
            "Learned from project"
        );

        if let Some(hooks) = &self.hooks {
            hooks
                .emit(&HookContext::ProjectLearned {
                    project_id,
                    report: &report,
                })
                .await;
        }

        report
    }

    /// Roda cada padrão aplicável sobre cada arquivo válido.
    async fn extract_instances(&mut self, files: &[SourceFile]) -> BTreeMap<String, Vec<LearnedInstance>> {
        let mut extracted: BTreeMap<String, Vec<LearnedInstance>> = BTreeMap::new();

        for file in files {
            if file.path.is_empty() || file.content.is_empty() {
                continue;
            }

            let language_id = language_from_path(&file.path);
            let mut context = PatternContext::new(&file.path, language_id, ParserKind::Custom);
            if self.settings.use_blocks {
                if let Some(extractor) = &self.block_extractor {
                    context = context.with_blocks(extractor.extract(language_id, &file.content));
                }
            }

            for pattern in self.patterns.iter_mut() {
                if !language_applies(pattern.language_id(), language_id) {
                    continue;
                }

                let found = pattern.matches(&file.content, Some(&context)).await;
                if found.is_empty() {
                    continue;
                }

                let name = pattern.name().to_string();
                let bucket = extracted.entry(name.clone()).or_default();
                bucket.extend(found.into_iter().map(|m| LearnedInstance {
                    pattern_name: name.clone(),
                    language_id: language_id.to_string(),
                    file_path: file.path.clone(),
                    text: m.text,
                    groups: m.groups,
                    named_groups: m.named_groups,
                }));
            }
        }

        extracted
    }

    /// Agrupa as instâncias e generaliza cada grupo.
    fn derive_variations(&self, instances: &[LearnedInstance]) -> Vec<String> {
        let texts: Vec<&str> = instances.iter().map(|i| i.text.as_str()).collect();
        let mut variations = Vec::new();

        for group in group_by_content(&texts, &self.settings.thresholds, self.settings.min_group_size) {
            let examples: Vec<&str> = group.iter().map(|&i| texts[i]).collect();
            if let Some(variation) = generate_regex_from_examples(&examples, self.settings.max_examples) {
                if !variations.contains(&variation) {
                    variations.push(variation);
                }
            }
        }

        variations
    }

    fn offer_known_variations(&mut self) {
        for pattern in self.patterns.iter_mut() {
            let variations = self.insights.variations(pattern.name());
            if !variations.is_empty() {
                pattern.offer_variations(variations);
            }
        }
    }

    /// Instala a melhor variação de cada padrão alvo (todos, se `None`).
    ///
    /// Retorna `nome → melhorado?` para cada padrão alvo existente.
    pub async fn apply_improvements(&mut self, pattern_names: Option<&[&str]>) -> BTreeMap<String, bool> {
        self.initialize().await;

        let mut results = BTreeMap::new();
        let mut applied = Vec::new();

        for pattern in self.patterns.iter_mut() {
            let name = pattern.name().to_string();
            if pattern_names.is_some_and(|names| !names.contains(&name.as_str())) {
                continue;
            }

            let before = pattern.metrics().success_rate();
            let current = pattern.base().text_rule().to_string();
            let candidate = select_best_variation(self.insights.variations(&name), &current)
                .map(|variation| merge_rules(&current, variation))
                .filter(|rule| *rule != current);

            let improved = match candidate {
                Some(rule) => match pattern.base_mut().install_text_rule(&rule) {
                    Ok(()) => {
                        let after = pattern.metrics().success_rate();
                        applied.push((name.clone(), PatternImprovement::regex(current, rule), before, after));
                        true
                    }
                    Err(e) => {
                        tracing::warn!(pattern = %name, error = %e, "Improvement rejected");
                        false
                    }
                },
                None => false,
            };

            results.insert(name, improved);
        }

        for (name, improvement, before, after) in applied {
            let metrics = &mut self.insights.metrics;
            metrics.regex_improvements += 1;
            metrics.patterns_improved += 1;
            metrics.success_rate_before.insert(name.clone(), before);
            metrics.success_rate_after.insert(name.clone(), after);

            tracing::info!(pattern = %name, rule = %improvement.improved, "Improved pattern");

            if let Some(hooks) = &self.hooks {
                hooks
                    .emit(&HookContext::PatternImproved {
                        pattern: &name,
                        improvement: &improvement,
                    })
                    .await;
            }

            self.insights
                .pattern_improvements
                .entry(name)
                .or_default()
                .push(improvement);
        }

        self.insights.metrics.last_update = Utc::now();
        self.persist().await;

        results
    }

    /// Grava o snapshot. Falhas são logadas e ignoradas.
    pub async fn persist(&mut self) {
        self.insights.timestamp = Some(Utc::now());
        if let Err(e) = self.store.save(&self.insights).await {
            tracing::warn!(store = %self.store.describe(), error = %e, "Error saving insights");
        }
    }

    /// Apaga todo o estado aprendido (memória e store).
    ///
    /// Regras já instaladas nos padrões vivos não são revertidas.
    pub async fn reset(&mut self) -> PadraoResult<()> {
        self.insights = InsightsSnapshot::default();
        self.store.clear().await?;
        tracing::info!(store = %self.store.describe(), "Insights cleared");
        Ok(())
    }

    /// Grava o estado e sinaliza o encerramento.
    pub async fn cleanup(&mut self) {
        self.persist().await;

        if let Some(hooks) = &self.hooks {
            hooks
                .emit(&HookContext::Shutdown {
                    component: LEARNER_COMPONENT,
                })
                .await;
        }
    }

    /// Acrescenta variações vindas de fora e as oferece aos padrões.
    pub(crate) fn merge_variations(&mut self, pattern: &str, variations: Vec<String>) -> usize {
        let added = self.insights.add_variations(pattern, variations);
        if added > 0 {
            self.offer_known_variations();
        }
        added
    }
}

impl std::fmt::Debug for CrossProjectLearner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossProjectLearner")
            .field("patterns", &self.patterns.len())
            .field("store", &self.store.describe())
            .field("initialized", &self.initialized)
            .field("projects", &self.insights.training_projects.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::store::MemoryStore;
    use crate::patterns::{AdaptivePattern, BasePattern, PatternDefinition};
    use crate::structural::NoStructuralEngine;
    use crate::PadraoError;
    use async_trait::async_trait;

    fn create_test_pattern(name: &str, rule: &str, language: &str) -> Box<dyn QueryPattern> {
        let base = BasePattern::new(
            PatternDefinition::new(name, rule).language(language),
            Arc::new(NoStructuralEngine),
        )
        .unwrap();
        Box::new(AdaptivePattern::new(base))
    }

    fn create_test_learner(store: Arc<MemoryStore>) -> CrossProjectLearner {
        CrossProjectLearner::new(
            vec![
                create_test_pattern("call", r"\w+\(\)", "*"),
                create_test_pattern("rust_only", "fn", "rust"),
            ],
            store,
        )
    }

    fn create_test_files() -> Vec<SourceFile> {
        vec![
            SourceFile::new("a.py", "x = get_name()\ny = get_age()"),
            SourceFile::new("b.py", "fn z = get_game()"),
            SourceFile::new("", "ignored()"),
            SourceFile::new("empty.py", ""),
        ]
    }

    #[tokio::test]
    async fn test_learn_collects_and_generalizes() {
        let store = Arc::new(MemoryStore::new());
        let mut learner = create_test_learner(store.clone());

        let report = learner.learn_from_project("p1", &create_test_files()).await;

        assert!(!report.skipped);
        assert_eq!(report.file_count, 4);
        assert_eq!(report.pattern_counts["call"], 3);
        // rust_only não se aplica a arquivos .py
        assert!(!report.pattern_counts.contains_key("rust_only"));
        assert_eq!(learner.insights().variations("call"), [r"get_[a-zA-Z]+e\(\)".to_string()]);
        assert_eq!(report.new_variations, 1);
        assert_eq!(store.save_count(), 1);
        assert_eq!(learner.insights().metrics.projects_analyzed, 1);
    }

    #[tokio::test]
    async fn test_learn_is_idempotent() {
        let store = Arc::new(MemoryStore::new());
        let mut learner = create_test_learner(store.clone());

        learner.learn_from_project("p1", &create_test_files()).await;
        let snapshot = learner.insights().clone();
        let again = learner.learn_from_project("p1", &create_test_files()).await;

        assert!(again.skipped);
        assert_eq!(learner.insights(), &snapshot);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_apply_improvements_merges_variation() {
        let mut learner = create_test_learner(Arc::new(MemoryStore::new()));
        learner.learn_from_project("p1", &create_test_files()).await;

        let results = learner.apply_improvements(Some(&["call"])).await;

        assert_eq!(results.len(), 1);
        assert!(results["call"]);
        assert_eq!(
            learner.pattern("call").unwrap().base().text_rule(),
            r"(?:\w+\(\)|get_[a-zA-Z]+e\(\))"
        );
        let log = &learner.insights().pattern_improvements["call"];
        assert_eq!(log[0].original, r"\w+\(\)");
        assert_eq!(learner.insights().metrics.regex_improvements, 1);

        // sem variações novas, nada muda
        let again = learner.apply_improvements(None).await;
        assert!(!again["call"]);
        assert!(!again["rust_only"]);
    }

    #[tokio::test]
    async fn test_improvement_survives_new_learner() {
        let store = Arc::new(MemoryStore::new());
        let mut first = create_test_learner(store.clone());
        first.learn_from_project("p1", &create_test_files()).await;
        assert!(first.apply_improvements(None).await["call"]);
        first.cleanup().await;

        let mut second = create_test_learner(store.clone());
        let results = second.apply_improvements(None).await;

        assert!(!results["call"]);
        assert_eq!(
            second.pattern("call").unwrap().base().text_rule(),
            r"(?:\w+\(\)|get_[a-zA-Z]+e\(\))"
        );
        assert_eq!(second.insights().pattern_improvements["call"].len(), 1);
        assert_eq!(second.insights().metrics.patterns_improved, 1);
        assert_eq!(second.insights().metrics.regex_improvements, 1);
    }

    #[tokio::test]
    async fn test_edited_rule_is_not_overwritten() {
        let mut snapshot = InsightsSnapshot::default();
        snapshot
            .pattern_improvements
            .entry("call".to_string())
            .or_default()
            .push(PatternImprovement::regex(r"\w+\[\]", "get_[a-z]+"));
        let mut learner = create_test_learner(Arc::new(MemoryStore::with_snapshot(snapshot)));

        learner.initialize().await;

        assert_eq!(learner.pattern("call").unwrap().base().text_rule(), r"\w+\(\)");
    }

    #[tokio::test]
    async fn test_initialize_loads_snapshot_once() {
        let mut snapshot = InsightsSnapshot::default();
        snapshot.training_projects.insert("old".to_string());
        snapshot.add_variations("call", vec!["get_[a-z]+".to_string()]);
        let store = Arc::new(MemoryStore::with_snapshot(snapshot));
        let mut learner = create_test_learner(store);

        learner.initialize().await;

        assert!(learner.is_initialized());
        assert!(learner.learn_from_project("old", &[]).await.skipped);
    }

    struct BrokenStore;

    #[async_trait]
    impl InsightsStore for BrokenStore {
        fn describe(&self) -> String {
            "broken".to_string()
        }

        async fn load(&self) -> PadraoResult<Option<InsightsSnapshot>> {
            Err(PadraoError::persistence("unreadable"))
        }

        async fn save(&self, _snapshot: &InsightsSnapshot) -> PadraoResult<()> {
            Err(PadraoError::persistence("read-only"))
        }

        async fn clear(&self) -> PadraoResult<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_failures_are_not_fatal() {
        let mut learner = CrossProjectLearner::new(
            vec![create_test_pattern("call", r"\w+\(\)", "*")],
            Arc::new(BrokenStore),
        );

        let report = learner.learn_from_project("p1", &create_test_files()).await;

        assert!(!report.skipped);
        assert!(learner.insights().is_trained("p1"));
    }

    #[tokio::test]
    async fn test_reset_clears_state() {
        let store = Arc::new(MemoryStore::new());
        let mut learner = create_test_learner(store.clone());
        learner.learn_from_project("p1", &create_test_files()).await;

        learner.reset().await.unwrap();

        assert!(learner.insights().is_empty());
        assert!(store.load().await.unwrap().is_none());
    }
}
