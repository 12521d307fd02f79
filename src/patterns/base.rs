//! Padrão base: regra, métricas e cache, sem adaptação nem recuperação.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use crate::blocks::BlockExtractor;
use crate::cache::{CacheStats, MatchCache};
use crate::structural::StructuralEngine;
use crate::types::{
    ExtractedBlock, MatchError, MatchInstance, ParserKind, PatternContext, PatternValidationError,
};

use super::metrics::{MetricsUpdate, PerformanceMetrics};
use super::rule::{Rule, TextRule};
use super::QueryPattern;

/// Função pura que transforma um match cru em campos estruturados.
pub type Extractor =
    Arc<dyn Fn(&MatchInstance) -> Option<serde_json::Map<String, serde_json::Value>> + Send + Sync>;

/// Limite padrão de instâncias por aplicação de regra.
pub const DEFAULT_MAX_MATCHES: usize = 10_000;

/// Descrição de um padrão antes da validação.
#[derive(Clone)]
pub struct PatternDefinition {
    pub name: String,
    pub rule: String,
    pub category: String,
    pub purpose: String,
    pub language_id: String,
    pub confidence: f64,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub extract: Option<Extractor>,
}

impl PatternDefinition {
    /// Cria uma definição para qualquer linguagem, confiança 0.8.
    pub fn new(name: impl Into<String>, rule: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rule: rule.into(),
            category: String::new(),
            purpose: String::new(),
            language_id: "*".to_string(),
            confidence: 0.8,
            metadata: BTreeMap::new(),
            extract: None,
        }
    }

    pub fn language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = purpose.into();
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn extract(mut self, extractor: Extractor) -> Self {
        self.extract = Some(extractor);
        self
    }
}

impl std::fmt::Debug for PatternDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PatternDefinition")
            .field("name", &self.name)
            .field("rule", &self.rule)
            .field("language_id", &self.language_id)
            .field("has_extract", &self.extract.is_some())
            .finish()
    }
}

/// Padrão base.
///
/// A regra é estrutural quando o motor suporta a linguagem do padrão e textual
/// caso contrário. Um padrão estrutural pode receber uma regra textual aprendida,
/// consultada quando a consulta estrutural não encontra nada.
pub struct BasePattern {
    name: String,
    category: String,
    purpose: String,
    language_id: String,
    confidence: f64,
    metadata: BTreeMap<String, serde_json::Value>,
    extract: Option<Extractor>,
    rule: Rule,
    learned_rule: Option<TextRule>,
    engine: Arc<dyn StructuralEngine>,
    block_extractor: Option<Arc<dyn BlockExtractor>>,
    max_matches: usize,
    metrics: PerformanceMetrics,
    cache: Option<MatchCache>,
}

impl BasePattern {
    /// Valida a definição e constrói o padrão.
    pub fn new(
        definition: PatternDefinition,
        engine: Arc<dyn StructuralEngine>,
    ) -> Result<Self, PatternValidationError> {
        let PatternDefinition {
            name,
            rule,
            category,
            purpose,
            language_id,
            confidence,
            metadata,
            extract,
        } = definition;

        if name.trim().is_empty() {
            return Err(PatternValidationError::EmptyName);
        }
        if rule.trim().is_empty() {
            return Err(PatternValidationError::EmptyRule { name });
        }
        if !(0.0..=1.0).contains(&confidence) {
            return Err(PatternValidationError::InvalidConfidence {
                name,
                value: confidence,
            });
        }

        let rule = if engine.supports_language(&language_id) {
            if let Err(message) = engine.validate_query(&language_id, &rule) {
                return Err(PatternValidationError::InvalidStructuralQuery { name, message });
            }
            Rule::Structural(rule)
        } else {
            match TextRule::compile(&rule) {
                Ok(compiled) => Rule::Textual(compiled),
                Err(source) => return Err(PatternValidationError::InvalidRegex { name, source }),
            }
        };

        tracing::debug!(
            pattern = %name,
            language = %language_id,
            structural = rule.is_structural(),
            "Pattern created"
        );

        Ok(Self {
            name,
            category,
            purpose,
            language_id,
            confidence,
            metadata,
            extract,
            rule,
            learned_rule: None,
            engine,
            block_extractor: None,
            max_matches: DEFAULT_MAX_MATCHES,
            metrics: PerformanceMetrics::new(),
            cache: Some(MatchCache::default_config()),
        })
    }

    /// Troca (ou remove) o cache.
    pub fn with_cache(mut self, cache: Option<MatchCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Define o extrator de blocos usado quando o contexto não traz blocos.
    pub fn with_block_extractor(mut self, extractor: Arc<dyn BlockExtractor>) -> Self {
        self.block_extractor = Some(extractor);
        self
    }

    /// Define o limite de instâncias por aplicação de regra.
    pub fn with_max_matches(mut self, max_matches: usize) -> Self {
        self.max_matches = max_matches.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    /// Parser que executa a regra principal.
    pub fn parser_kind(&self) -> ParserKind {
        if self.rule.is_structural() {
            ParserKind::TreeSitter
        } else {
            ParserKind::Custom
        }
    }

    /// Regra textual atual: a regex de um padrão textual, ou a regra aprendida
    /// de um padrão estrutural (vazia se não houver).
    pub fn text_rule(&self) -> &str {
        match (&self.rule, &self.learned_rule) {
            (Rule::Textual(rule), _) => rule.as_str(),
            (Rule::Structural(_), Some(learned)) => learned.as_str(),
            (Rule::Structural(_), None) => "",
        }
    }

    /// Instala uma nova regra textual e invalida o cache.
    pub fn install_text_rule(&mut self, source: &str) -> Result<(), PatternValidationError> {
        if source.trim().is_empty() {
            return Err(PatternValidationError::EmptyRule {
                name: self.name.clone(),
            });
        }
        let compiled =
            TextRule::compile(source).map_err(|source| PatternValidationError::InvalidRegex {
                name: self.name.clone(),
                source,
            })?;

        let previous = self.text_rule().to_string();
        match &mut self.rule {
            Rule::Textual(rule) => *rule = compiled,
            Rule::Structural(_) => self.learned_rule = Some(compiled),
        }
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }

        tracing::info!(
            pattern = %self.name,
            previous = %previous,
            rule = %source,
            "Text rule installed"
        );
        Ok(())
    }

    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(MatchCache::stats)
    }

    /// Núcleo falível do match: cache, blocos, fallback para o texto inteiro.
    ///
    /// Registra exatamente uma observação nas métricas, inclusive em caso de erro.
    pub(crate) async fn run(
        &mut self,
        source: &str,
        context: Option<&PatternContext>,
    ) -> Result<Vec<MatchInstance>, MatchError> {
        let started = Instant::now();
        let context_key = context.map(PatternContext::context_key);
        let cache_key =
            MatchCache::cache_key(source, context_key.as_deref().unwrap_or(""), self.parser_kind());

        if let Some(cached) = self.cache.as_mut().and_then(|c| c.get(&cache_key)) {
            self.observe(!cached.is_empty(), started, context, context_key.as_deref(), Some(true));
            return Ok(cached);
        }

        let cache_hit = self.cache.as_ref().map(|_| false);
        match self.collect(source, context).await {
            Ok(found) => {
                self.observe(!found.is_empty(), started, context, context_key.as_deref(), cache_hit);
                if let Some(cache) = self.cache.as_mut() {
                    cache.insert(cache_key, found.clone());
                }
                Ok(found)
            }
            Err(e) => {
                self.observe(false, started, context, context_key.as_deref(), cache_hit);
                Err(e)
            }
        }
    }

    async fn collect(
        &self,
        source: &str,
        context: Option<&PatternContext>,
    ) -> Result<Vec<MatchInstance>, MatchError> {
        let extracted: Vec<ExtractedBlock>;
        let blocks: &[ExtractedBlock] = match context {
            Some(ctx) if !ctx.blocks.is_empty() => &ctx.blocks,
            _ => {
                let language = context
                    .map(|c| c.language_id.as_str())
                    .unwrap_or(&self.language_id);
                extracted = self
                    .block_extractor
                    .as_ref()
                    .map(|e| e.extract(language, source))
                    .unwrap_or_default();
                &extracted
            }
        };

        let mut found = Vec::new();
        for block in blocks {
            match self.match_unit(&block.content).await {
                Ok(matches) => found.extend(matches.into_iter().map(|m| m.within(block))),
                Err(e) => tracing::debug!(
                    pattern = %self.name,
                    node_type = %block.node_type,
                    error = %e,
                    "Block match failed"
                ),
            }
        }

        if found.is_empty() {
            found = self.match_unit(source).await?;
        }

        Ok(found)
    }

    /// Aplica a regra atual a um único trecho de texto.
    pub(crate) async fn match_unit(&self, text: &str) -> Result<Vec<MatchInstance>, MatchError> {
        let found = match &self.rule {
            Rule::Textual(rule) => rule.find_all(text, self.max_matches)?,
            Rule::Structural(query) => {
                let found = self.engine.run_query(&self.language_id, query, text).await?;
                if found.len() > self.max_matches {
                    return Err(MatchError::match_limit(self.max_matches));
                }
                match &self.learned_rule {
                    Some(learned) if found.is_empty() => learned.find_all(text, self.max_matches)?,
                    _ => found,
                }
            }
        };

        Ok(self.apply_extractor(found))
    }

    /// Aplica uma regra textual alternativa (usada pela recuperação).
    pub(crate) fn match_with(
        &self,
        rule: &TextRule,
        text: &str,
    ) -> Result<Vec<MatchInstance>, MatchError> {
        Ok(self.apply_extractor(rule.find_all(text, self.max_matches)?))
    }

    fn apply_extractor(&self, mut found: Vec<MatchInstance>) -> Vec<MatchInstance> {
        if let Some(extract) = &self.extract {
            for instance in &mut found {
                if let Some(fields) = extract(instance) {
                    instance.fields.extend(fields);
                }
            }
        }
        found
    }

    fn observe(
        &mut self,
        success: bool,
        started: Instant,
        context: Option<&PatternContext>,
        context_key: Option<&str>,
        cache_hit: Option<bool>,
    ) {
        self.metrics.update(MetricsUpdate {
            success,
            execution_time: started.elapsed().as_secs_f64(),
            context_key,
            parser_kind: Some(context.map(|c| c.parser_kind).unwrap_or_default()),
            pattern_name: Some(&self.name),
            cache_hit,
        });
    }
}

impl std::fmt::Debug for BasePattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasePattern")
            .field("name", &self.name)
            .field("language_id", &self.language_id)
            .field("rule", &self.rule)
            .field("text_rule", &self.text_rule())
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[async_trait]
impl QueryPattern for BasePattern {
    fn base(&self) -> &BasePattern {
        self
    }

    fn base_mut(&mut self) -> &mut BasePattern {
        self
    }

    async fn matches(
        &mut self,
        source: &str,
        context: Option<&PatternContext>,
    ) -> Vec<MatchInstance> {
        match self.run(source, context).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(pattern = %self.name, error = %e, "Match failed");
                Vec::new()
            }
        }
    }
}
