//! Construção de padrões a partir do catálogo da configuração.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::MatchCache;
use crate::hooks::HookSystem;
use crate::structural::StructuralEngine;
use crate::types::config::{Config, PatternMode, PatternSpec};
use crate::types::PatternValidationError;
use crate::{PadraoError, PadraoResult};

use super::adaptive::{AdaptationThresholds, AdaptivePattern};
use super::base::{BasePattern, PatternDefinition};
use super::resilient::{RecoverySettings, ResilientPattern};
use super::QueryPattern;

/// Constrói um padrão a partir de uma entrada do catálogo.
pub fn build_pattern(
    spec: &PatternSpec,
    engine: Arc<dyn StructuralEngine>,
    config: &Config,
    hooks: Option<Arc<HookSystem>>,
) -> Result<Box<dyn QueryPattern>, PatternValidationError> {
    let mut definition = PatternDefinition::new(&spec.name, &spec.rule)
        .language(&spec.language)
        .category(&spec.category)
        .purpose(&spec.purpose)
        .confidence(spec.confidence);
    definition.metadata = spec.metadata.clone();

    let cache = config.cache.enabled.then(|| {
        let ttl = (config.cache.ttl_secs > 0).then(|| Duration::from_secs(config.cache.ttl_secs));
        MatchCache::new(config.cache.capacity, ttl)
    });

    let base = BasePattern::new(definition, engine)?
        .with_cache(cache)
        .with_max_matches(config.matching.max_matches);

    let adaptive = |base: BasePattern| {
        let pattern = AdaptivePattern::new(base)
            .with_thresholds(AdaptationThresholds::from(&config.adaptation))
            .with_adaptation_enabled(config.adaptation.enabled);
        match hooks.clone() {
            Some(hooks) => pattern.with_hooks(hooks),
            None => pattern,
        }
    };

    Ok(match spec.mode {
        PatternMode::Base => Box::new(base),
        PatternMode::Adaptive => Box::new(adaptive(base)),
        PatternMode::Resilient => Box::new(
            ResilientPattern::new(adaptive(base))
                .with_settings(RecoverySettings::from(&config.matching)),
        ),
    })
}

/// Constrói o catálogo inteiro. Falha no primeiro padrão inválido.
///
/// Nomes repetidos para a mesma linguagem também são rejeitados.
pub fn load_catalog(
    config: &Config,
    engine: Arc<dyn StructuralEngine>,
    hooks: Option<Arc<HookSystem>>,
) -> PadraoResult<Vec<Box<dyn QueryPattern>>> {
    let mut seen = HashSet::new();
    let mut patterns = Vec::with_capacity(config.patterns.len());

    for spec in &config.patterns {
        if !seen.insert((spec.name.as_str(), spec.language.as_str())) {
            return Err(PadraoError::config(format!(
                "padrão duplicado: {} ({})",
                spec.name, spec.language
            )));
        }
        patterns.push(build_pattern(spec, Arc::clone(&engine), config, hooks.clone())?);
    }

    tracing::info!(patterns = patterns.len(), engine = %engine.name(), "Catalog loaded");
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural::NoStructuralEngine;

    fn engine() -> Arc<dyn StructuralEngine> {
        Arc::new(NoStructuralEngine)
    }

    #[test]
    fn test_starter_catalog_loads() {
        let config = Config::starter();
        let patterns = load_catalog(&config, engine(), None).unwrap();

        assert_eq!(patterns.len(), config.patterns.len());
        assert_eq!(patterns[0].name(), "accessor");
        assert_eq!(patterns[2].language_id(), "python");
    }

    #[test]
    fn test_invalid_entry_fails_fast() {
        let mut config = Config::default_config();
        config.patterns.push(PatternSpec::new("ok", "x"));
        config.patterns.push(PatternSpec::new("broken", "get_("));

        let err = load_catalog(&config, engine(), None).err().expect("expected load_catalog to fail");
        assert!(matches!(
            err,
            PadraoError::Validation(PatternValidationError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut config = Config::default_config();
        config.patterns.push(PatternSpec::new("dup", "a"));
        config.patterns.push(PatternSpec::new("dup", "b"));

        assert!(matches!(
            load_catalog(&config, engine(), None),
            Err(PadraoError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_modes_and_cache_settings() {
        let mut config = Config::default_config();
        config.cache.enabled = false;
        let mut spec = PatternSpec::new("p", "a+");
        spec.mode = PatternMode::Base;

        let mut pattern = build_pattern(&spec, engine(), &config, None).unwrap();
        pattern.matches("aa", None).await;

        assert!(pattern.base().cache_stats().is_none());
        assert_eq!(pattern.metrics().total_uses, 1);
    }
}
