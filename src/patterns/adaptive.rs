//! Padrão adaptativo: troca a própria regra quando o desempenho em um contexto cai.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hooks::{HookContext, HookSystem};
use crate::learning::generalize::{merge_rules, select_best_variation};
use crate::types::config::AdaptationConfig;
use crate::types::{MatchInstance, ParserKind, PatternContext};

use super::base::BasePattern;
use super::QueryPattern;

/// Limiares do gatilho de adaptação.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptationThresholds {
    /// Usos necessários (estritamente mais que) para confiar em um balde.
    pub min_samples: u64,
    /// Taxa de sucesso abaixo da qual o padrão se adapta.
    pub success_threshold: f64,
}

impl Default for AdaptationThresholds {
    fn default() -> Self {
        Self {
            min_samples: 10,
            success_threshold: 0.5,
        }
    }
}

impl From<&AdaptationConfig> for AdaptationThresholds {
    fn from(config: &AdaptationConfig) -> Self {
        Self {
            min_samples: config.min_samples,
            success_threshold: config.success_threshold,
        }
    }
}

/// Registro de uma tentativa de adaptação.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationRecord {
    pub timestamp: DateTime<Utc>,
    pub context_key: String,
    pub parser_kind: ParserKind,
    pub language_id: String,
    pub success_rate_before: f64,
    pub previous_rule: String,
    pub new_rule: String,
    pub changed: bool,
}

/// Padrão base com adaptação ao contexto.
pub struct AdaptivePattern {
    base: BasePattern,
    thresholds: AdaptationThresholds,
    enabled: bool,
    variations: Vec<String>,
    adaptations: Vec<AdaptationRecord>,
    hooks: Option<Arc<HookSystem>>,
}

impl AdaptivePattern {
    pub fn new(base: BasePattern) -> Self {
        Self {
            base,
            thresholds: AdaptationThresholds::default(),
            enabled: true,
            variations: Vec::new(),
            adaptations: Vec::new(),
            hooks: None,
        }
    }

    pub fn with_thresholds(mut self, thresholds: AdaptationThresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Liga/desliga o gatilho (a adaptação explícita continua disponível).
    pub fn with_adaptation_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<HookSystem>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    pub fn variations(&self) -> &[String] {
        &self.variations
    }

    pub fn adaptations(&self) -> &[AdaptationRecord] {
        &self.adaptations
    }

    /// Decide se o padrão deve se adaptar neste contexto.
    ///
    /// Um balde de contexto existente decide sozinho (`uses > min_samples` e taxa
    /// abaixo do limiar). Sem balde, vale o desempenho do tipo de parser do contexto.
    pub fn should_adapt(&self, context: &PatternContext) -> bool {
        let metrics = self.base.metrics();

        if let Some(bucket) = metrics.context(&context.context_key()) {
            return bucket.uses > self.thresholds.min_samples
                && bucket.success_rate() < self.thresholds.success_threshold;
        }

        metrics.parser(context.parser_kind).is_some_and(|stats| {
            stats.total > self.thresholds.min_samples
                && stats.success_rate() < self.thresholds.success_threshold
        })
    }

    /// Instala a melhor variação disponível e registra a tentativa.
    ///
    /// Retorna `true` se a regra mudou.
    pub async fn adapt_to_context(&mut self, context: &PatternContext) -> bool {
        let context_key = context.context_key();
        let success_rate_before = self
            .base
            .metrics()
            .context(&context_key)
            .map(|b| b.success_rate())
            .unwrap_or_else(|| self.base.metrics().parser_success_rate(context.parser_kind));

        let previous_rule = self.base.text_rule().to_string();
        let candidate = select_best_variation(&self.variations, &previous_rule)
            .map(|variation| merge_rules(&previous_rule, variation));

        let changed = match candidate {
            Some(rule) if rule != previous_rule => match self.base.install_text_rule(&rule) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!(pattern = %self.base.name(), error = %e, "Adapted rule rejected");
                    false
                }
            },
            _ => false,
        };

        let record = AdaptationRecord {
            timestamp: Utc::now(),
            context_key,
            parser_kind: context.parser_kind,
            language_id: context.language_id.clone(),
            success_rate_before,
            new_rule: self.base.text_rule().to_string(),
            previous_rule,
            changed,
        };

        tracing::debug!(
            pattern = %self.base.name(),
            context_key = %record.context_key,
            changed,
            "Pattern adapted to context"
        );

        if let Some(hooks) = &self.hooks {
            hooks
                .emit(&HookContext::PatternAdapted {
                    pattern: self.base.name(),
                    record: &record,
                })
                .await;
        }

        self.adaptations.push(record);
        changed
    }

    /// Roda o gatilho de adaptação antes do match, se cabível.
    pub(crate) async fn maybe_adapt(&mut self, context: Option<&PatternContext>) {
        if let Some(ctx) = context {
            if self.enabled && self.should_adapt(ctx) {
                self.adapt_to_context(ctx).await;
            }
        }
    }

    pub(crate) fn hooks(&self) -> Option<&Arc<HookSystem>> {
        self.hooks.as_ref()
    }
}

impl std::fmt::Debug for AdaptivePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptivePattern")
            .field("base", &self.base)
            .field("variations", &self.variations.len())
            .field("adaptations", &self.adaptations.len())
            .finish()
    }
}

#[async_trait]
impl QueryPattern for AdaptivePattern {
    fn base(&self) -> &BasePattern {
        &self.base
    }

    fn base_mut(&mut self) -> &mut BasePattern {
        &mut self.base
    }

    async fn matches(
        &mut self,
        source: &str,
        context: Option<&PatternContext>,
    ) -> Vec<MatchInstance> {
        self.maybe_adapt(context).await;

        match self.base.run(source, context).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(pattern = %self.base.name(), error = %e, "Match failed");
                Vec::new()
            }
        }
    }

    fn offer_variations(&mut self, variations: &[String]) {
        for variation in variations {
            if !self.variations.contains(variation) {
                self.variations.push(variation.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::HookEvent;
    use crate::patterns::PatternDefinition;
    use crate::structural::NoStructuralEngine;

    fn create_test_pattern(rule: &str) -> AdaptivePattern {
        let base = BasePattern::new(PatternDefinition::new("getter", rule), Arc::new(NoStructuralEngine))
            .unwrap()
            .with_cache(None);
        AdaptivePattern::new(base)
    }

    fn context(file: &str) -> PatternContext {
        PatternContext::new(file, "python", ParserKind::Custom)
    }

    async fn run_many(pattern: &mut AdaptivePattern, source: &str, ctx: &PatternContext, n: usize) {
        for _ in 0..n {
            pattern.base_mut().run(source, Some(ctx)).await.ok();
        }
    }

    #[tokio::test]
    async fn test_should_adapt_after_many_failures() {
        let mut pattern = create_test_pattern("get_id");
        let ctx = context("a.py");

        run_many(&mut pattern, "nothing here", &ctx, 11).await;

        assert!(pattern.should_adapt(&ctx));
    }

    #[tokio::test]
    async fn test_should_not_adapt_with_few_samples() {
        let mut pattern = create_test_pattern("get_id");
        let ctx = context("a.py");

        run_many(&mut pattern, "nothing here", &ctx, 10).await;

        assert!(!pattern.should_adapt(&ctx));
    }

    #[tokio::test]
    async fn test_should_not_adapt_when_successful() {
        let mut pattern = create_test_pattern("get_id");
        let ctx = context("a.py");

        run_many(&mut pattern, "get_id", &ctx, 20).await;

        assert!(!pattern.should_adapt(&ctx));
    }

    #[tokio::test]
    async fn test_unseen_context_falls_back_to_parser_stats() {
        let mut pattern = create_test_pattern("get_id");
        let seen = context("a.py");
        run_many(&mut pattern, "nothing", &seen, 12).await;

        // mesmo parser, arquivo novo: sem balde, usa o parser
        assert!(pattern.should_adapt(&context("b.py")));

        let other_parser = PatternContext::new("c.py", "python", ParserKind::TreeSitter);
        assert!(!pattern.should_adapt(&other_parser));
    }

    #[tokio::test]
    async fn test_adapt_merges_best_variation() {
        let mut pattern = create_test_pattern("get_id");
        pattern.offer_variations(&["get_[a-zA-Z]+".to_string(), "x".to_string()]);

        let changed = pattern.adapt_to_context(&context("a.py")).await;

        assert!(changed);
        assert_eq!(pattern.base().text_rule(), "(?:get_id|get_[a-zA-Z]+)");
        let record = &pattern.adaptations()[0];
        assert_eq!(record.previous_rule, "get_id");
        assert_eq!(record.context_key, "a.py:0:0:custom:python");

        // segunda adaptação não funde a mesma variação de novo
        pattern.adapt_to_context(&context("a.py")).await;
        assert_eq!(pattern.base().text_rule(), "(?:(?:get_id|get_[a-zA-Z]+)|x)");
        pattern.adapt_to_context(&context("a.py")).await;
        assert!(!pattern.adaptations()[2].changed);
        assert_eq!(pattern.adaptations().len(), 3);
    }

    #[tokio::test]
    async fn test_adapt_without_variations_is_recorded() {
        let mut pattern = create_test_pattern("get_id");

        assert!(!pattern.adapt_to_context(&context("a.py")).await);
        assert_eq!(pattern.adaptations().len(), 1);
        assert_eq!(pattern.base().text_rule(), "get_id");
    }

    #[tokio::test]
    async fn test_matches_adapts_then_succeeds() {
        let mut pattern = create_test_pattern("get_id");
        let ctx = context("a.py");
        run_many(&mut pattern, "get_phone", &ctx, 11).await;
        pattern.offer_variations(&["get_[a-zA-Z]+".to_string()]);

        let found = pattern.matches("get_phone", Some(&ctx)).await;

        assert_eq!(found.len(), 1);
        assert_eq!(pattern.adaptations().len(), 1);
    }

    #[tokio::test]
    async fn test_adaptation_emits_hook() {
        use crate::hooks::MetricsHook;

        let metrics = Arc::new(MetricsHook::new());
        let mut hooks = HookSystem::new();
        hooks.register(Box::new(metrics.clone()));
        let mut pattern = create_test_pattern("get_id").with_hooks(Arc::new(hooks));

        pattern.adapt_to_context(&context("a.py")).await;

        assert_eq!(metrics.total_adaptations(), 1);
        assert_eq!(HookEvent::PatternAdapted.to_string(), "pattern_adapted");
    }
}
