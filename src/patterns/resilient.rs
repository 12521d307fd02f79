//! Padrão resiliente: classifica falhas e tenta recuperar antes de desistir.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::hooks::{HookContext, HookSystem};
use crate::types::config::MatchingConfig;
use crate::types::{MatchError, MatchErrorKind, MatchInstance, PatternContext};

use super::adaptive::AdaptivePattern;
use super::base::BasePattern;
use super::chunking::split_into_chunks;
use super::rule::{more_specific, relaxed, TextRule};
use super::QueryPattern;

/// Parâmetros da recuperação.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverySettings {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_retries: u32,
}

impl Default for RecoverySettings {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 100,
            max_retries: 3,
        }
    }
}

impl From<&MatchingConfig> for RecoverySettings {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            max_retries: config.max_retries,
        }
    }
}

impl RecoverySettings {
    /// Aplica `chunk_size`, `chunk_overlap` e `max_retries` vindos dos metadados do padrão.
    pub fn with_overrides(mut self, metadata: &BTreeMap<String, serde_json::Value>) -> Self {
        let read = |key: &str| metadata.get(key).and_then(serde_json::Value::as_u64);

        if let Some(size) = read("chunk_size") {
            self.chunk_size = size as usize;
        }
        if let Some(overlap) = read("chunk_overlap") {
            self.chunk_overlap = overlap as usize;
        }
        if let Some(retries) = read("max_retries") {
            self.max_retries = retries as u32;
        }
        self
    }
}

/// Tentativas e sucessos de recuperação para um tipo de erro.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryStats {
    pub attempts: u64,
    pub successes: u64,
}

/// Padrão adaptativo com recuperação de erros.
pub struct ResilientPattern {
    inner: AdaptivePattern,
    settings: RecoverySettings,
    recovery_stats: BTreeMap<MatchErrorKind, RecoveryStats>,
}

impl ResilientPattern {
    pub fn new(inner: AdaptivePattern) -> Self {
        let settings = RecoverySettings::default().with_overrides(inner.base().metadata());
        Self {
            inner,
            settings,
            recovery_stats: BTreeMap::new(),
        }
    }

    /// Define os parâmetros (metadados do padrão ainda têm precedência).
    pub fn with_settings(mut self, settings: RecoverySettings) -> Self {
        self.settings = settings.with_overrides(self.inner.base().metadata());
        self
    }

    pub fn settings(&self) -> RecoverySettings {
        self.settings
    }

    pub fn adaptive(&self) -> &AdaptivePattern {
        &self.inner
    }

    pub fn adaptive_mut(&mut self) -> &mut AdaptivePattern {
        &mut self.inner
    }

    pub fn recovery_stats(&self) -> &BTreeMap<MatchErrorKind, RecoveryStats> {
        &self.recovery_stats
    }

    async fn attempt_recovery(
        &self,
        kind: MatchErrorKind,
        source: &str,
    ) -> Result<Vec<MatchInstance>, MatchError> {
        let base = self.inner.base();
        let current = base.text_rule();

        match kind {
            MatchErrorKind::SyntaxError if !current.is_empty() => {
                retry_with_rule(base, &relaxed(current), source)
            }
            MatchErrorKind::AmbiguousMatchError if !current.is_empty() => {
                retry_with_rule(base, &more_specific(current), source)
            }
            _ => self.chunked(base, source).await,
        }
    }

    /// Aplica a regra janela a janela, reduzindo a janela pela metade a cada falha.
    async fn chunked(
        &self,
        base: &BasePattern,
        source: &str,
    ) -> Result<Vec<MatchInstance>, MatchError> {
        let mut size = self.settings.chunk_size.max(1);
        let mut last_error = None;

        for attempt in 0..self.settings.max_retries.max(1) {
            let overlap = self.settings.chunk_overlap.min(size.saturating_sub(1));
            let chunks = split_into_chunks(source, size, overlap);
            let mut found = Vec::new();
            let mut failed = false;

            for (i, chunk) in chunks.iter().enumerate() {
                match base.match_unit(chunk.text).await {
                    Ok(matches) => {
                        // bordas internas vistas por uma janela vizinha podem cortar matches
                        let cut_left = i > 0 && chunks[i - 1].end > chunk.start;
                        let cut_right = chunks.get(i + 1).is_some_and(|next| next.start < chunk.end);
                        found.extend(
                            matches
                                .into_iter()
                                .filter(|m| !(cut_left && m.start == 0))
                                .filter(|m| !(cut_right && m.end == chunk.text.len()))
                                .map(|m| m.shifted(chunk.start)),
                        );
                    }
                    Err(e) => {
                        last_error = Some(e);
                        failed = true;
                        break;
                    }
                }
            }

            if !failed {
                return Ok(keep_outermost(found));
            }

            tracing::debug!(
                pattern = %base.name(),
                attempt,
                chunk_size = size,
                "Chunked retry failed"
            );
            size = (size / 2).max(1);
        }

        Err(last_error.unwrap_or_else(|| MatchError::new("chunked recovery failed")))
    }

    async fn notify(&self, kind: MatchErrorKind, recovered: usize, success: bool) {
        if let Some(hooks) = self.inner.hooks() {
            emit_recovery(hooks, self.inner.base().name(), kind, recovered, success).await;
        }
    }
}

/// Ordena por posição e descarta matches repetidos ou contidos em outro.
fn keep_outermost(mut found: Vec<MatchInstance>) -> Vec<MatchInstance> {
    found.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut kept: Vec<MatchInstance> = Vec::with_capacity(found.len());
    for m in found {
        if kept.last().is_some_and(|last| m.end <= last.end) {
            continue;
        }
        kept.push(m);
    }
    kept
}

fn retry_with_rule(
    base: &BasePattern,
    rule: &str,
    source: &str,
) -> Result<Vec<MatchInstance>, MatchError> {
    let rule = TextRule::compile(rule).map_err(|e| MatchError::new(e.to_string()))?;
    base.match_with(&rule, source)
}

async fn emit_recovery(
    hooks: &Arc<HookSystem>,
    pattern: &str,
    kind: MatchErrorKind,
    recovered: usize,
    success: bool,
) {
    hooks
        .emit(&HookContext::MatchRecovered {
            pattern,
            kind,
            recovered,
            success,
        })
        .await;
}

impl std::fmt::Debug for ResilientPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientPattern")
            .field("inner", &self.inner)
            .field("settings", &self.settings)
            .field("recovery_stats", &self.recovery_stats)
            .finish()
    }
}

#[async_trait]
impl QueryPattern for ResilientPattern {
    fn base(&self) -> &BasePattern {
        self.inner.base()
    }

    fn base_mut(&mut self) -> &mut BasePattern {
        self.inner.base_mut()
    }

    async fn matches(
        &mut self,
        source: &str,
        context: Option<&PatternContext>,
    ) -> Vec<MatchInstance> {
        self.inner.maybe_adapt(context).await;

        let error = match self.inner.base_mut().run(source, context).await {
            Ok(found) => return found,
            Err(e) => e,
        };

        let kind = error.kind();
        tracing::warn!(
            pattern = %self.inner.base().name(),
            error = %error,
            kind = %kind,
            "Match failed, attempting recovery"
        );

        let outcome = self.attempt_recovery(kind, source).await;
        let stats = self.recovery_stats.entry(kind).or_default();
        stats.attempts += 1;

        match outcome {
            Ok(found) => {
                if !found.is_empty() {
                    stats.successes += 1;
                }
                self.notify(kind, found.len(), true).await;
                found
                    .into_iter()
                    .map(|mut m| {
                        m.recovered = true;
                        m
                    })
                    .collect()
            }
            Err(recovery_error) => {
                tracing::error!(
                    pattern = %self.inner.base().name(),
                    kind = %kind,
                    error = %recovery_error,
                    "Recovery failed"
                );
                self.notify(kind, 0, false).await;
                Vec::new()
            }
        }
    }

    fn offer_variations(&mut self, variations: &[String]) {
        self.inner.offer_variations(variations);
    }
}
