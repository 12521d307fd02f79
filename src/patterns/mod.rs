//! Padrões de consulta.
//!
//! Três variantes atrás do trait [`QueryPattern`]:
//!
//! - [`BasePattern`]: regra, métricas e cache
//! - [`AdaptivePattern`]: + adaptação ao contexto a partir de variações aprendidas
//! - [`ResilientPattern`]: + classificação de erros e recuperação (chunks, regras reescritas)
//!
//! `matches` nunca falha: qualquer erro em tempo de execução vira lista vazia
//! e uma observação de falha nas métricas.

mod adaptive;
mod base;
mod catalog;
pub mod chunking;
pub mod metrics;
mod resilient;
pub mod rule;

pub use adaptive::{AdaptationRecord, AdaptationThresholds, AdaptivePattern};
pub use base::{BasePattern, Extractor, PatternDefinition, DEFAULT_MAX_MATCHES};
pub use catalog::{build_pattern, load_catalog};
pub use metrics::{ContextPerformance, MetricsSummary, MetricsUpdate, ParserStats, PerformanceMetrics};
pub use resilient::{RecoverySettings, RecoveryStats, ResilientPattern};
pub use rule::{Rule, TextRule};

use async_trait::async_trait;

use crate::types::{MatchInstance, PatternContext};

/// Interface comum dos padrões.
#[async_trait]
pub trait QueryPattern: Send + Sync {
    /// Padrão base (regra, métricas, metadados).
    fn base(&self) -> &BasePattern;

    /// Padrão base, mutável.
    fn base_mut(&mut self) -> &mut BasePattern;

    /// Aplica o padrão. Nunca falha.
    async fn matches(
        &mut self,
        source: &str,
        context: Option<&PatternContext>,
    ) -> Vec<MatchInstance>;

    /// Recebe variações de regra propostas pelo aprendizado.
    ///
    /// Padrões sem adaptação as ignoram.
    fn offer_variations(&mut self, _variations: &[String]) {}

    fn name(&self) -> &str {
        self.base().name()
    }

    fn language_id(&self) -> &str {
        self.base().language_id()
    }

    fn metrics(&self) -> &PerformanceMetrics {
        self.base().metrics()
    }
}
