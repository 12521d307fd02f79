//! Hooks padrão do Padrão.
//!
//! Este módulo contém hooks que vêm pré-configurados:
//! - `LoggingHook`: Registra eventos no log
//! - `MetricsHook`: Conta adaptações, recuperações e aprendizado
//! - `HealthHook`: Mantém o estado de saúde de cada componente

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::PadraoResult;

use super::{Hook, HookContext, HookEvent};

// ═══════════════════════════════════════════════════════════════════════════
// LoggingHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook que registra eventos no log.
#[derive(Debug, Default)]
pub struct LoggingHook;

impl LoggingHook {
    /// Cria um novo LoggingHook.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Hook for LoggingHook {
    fn name(&self) -> &str {
        "logging"
    }

    fn events(&self) -> &'static [HookEvent] {
        &HookEvent::ALL
    }

    async fn execute(&self, context: &HookContext<'_>) -> PadraoResult<()> {
        match context {
            HookContext::PatternAdapted { pattern, record } => {
                tracing::debug!(
                    pattern = %pattern,
                    context_key = %record.context_key,
                    changed = record.changed,
                    success_rate_before = record.success_rate_before,
                    "Pattern adaptation attempted"
                );
            }
            HookContext::MatchRecovered {
                pattern,
                kind,
                recovered,
                success,
            } => {
                if *success {
                    tracing::info!(pattern = %pattern, kind = %kind, recovered, "Match recovered");
                } else {
                    tracing::warn!(pattern = %pattern, kind = %kind, "Match could not be recovered");
                }
            }
            HookContext::ProjectLearned { project_id, report } => {
                tracing::info!(
                    project_id = %project_id,
                    file_count = report.file_count,
                    new_variations = report.new_variations,
                    skipped = report.skipped,
                    "Project learned"
                );
            }
            HookContext::PatternImproved {
                pattern,
                improvement,
            } => {
                tracing::info!(
                    pattern = %pattern,
                    original = %improvement.original,
                    improved = %improvement.improved,
                    "Pattern improved"
                );
            }
            HookContext::Shutdown { component } => {
                tracing::info!(component = %component, "Component shut down");
            }
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// MetricsHook
// ═══════════════════════════════════════════════════════════════════════════

/// Hook que coleta contadores de eventos.
#[derive(Debug, Default)]
pub struct MetricsHook {
    /// Tentativas de adaptação.
    adaptations: AtomicU64,

    /// Adaptações que trocaram a regra.
    rule_changes: AtomicU64,

    /// Recuperações bem-sucedidas.
    recoveries: AtomicU64,

    /// Recuperações que falharam.
    failed_recoveries: AtomicU64,

    /// Instâncias produzidas pela recuperação.
    recovered_instances: AtomicU64,

    /// Projetos aprendidos.
    projects: AtomicU64,

    /// Melhorias instaladas.
    improvements: AtomicU64,
}

impl MetricsHook {
    /// Cria um novo MetricsHook.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn total_adaptations(&self) -> u64 {
        self.adaptations.load(Ordering::Relaxed)
    }

    pub fn total_rule_changes(&self) -> u64 {
        self.rule_changes.load(Ordering::Relaxed)
    }

    pub fn total_recoveries(&self) -> u64 {
        self.recoveries.load(Ordering::Relaxed)
    }

    pub fn total_failed_recoveries(&self) -> u64 {
        self.failed_recoveries.load(Ordering::Relaxed)
    }

    pub fn total_projects(&self) -> u64 {
        self.projects.load(Ordering::Relaxed)
    }

    pub fn total_improvements(&self) -> u64 {
        self.improvements.load(Ordering::Relaxed)
    }

    /// Taxa de recuperação (sucessos / tentativas).
    pub fn recovery_rate(&self) -> f64 {
        let ok = self.total_recoveries();
        let total = ok + self.total_failed_recoveries();
        if total == 0 {
            0.0
        } else {
            ok as f64 / total as f64
        }
    }

    /// Retorna as métricas em formato estruturado.
    pub fn metrics(&self) -> Metrics {
        Metrics {
            adaptations: self.total_adaptations(),
            rule_changes: self.total_rule_changes(),
            recoveries: self.total_recoveries(),
            failed_recoveries: self.total_failed_recoveries(),
            recovered_instances: self.recovered_instances.load(Ordering::Relaxed),
            projects: self.total_projects(),
            improvements: self.total_improvements(),
            recovery_rate: self.recovery_rate(),
        }
    }
}

/// Métricas coletadas pelo MetricsHook.
#[derive(Debug, Clone, Serialize)]
pub struct Metrics {
    pub adaptations: u64,
    pub rule_changes: u64,
    pub recoveries: u64,
    pub failed_recoveries: u64,
    pub recovered_instances: u64,
    pub projects: u64,
    pub improvements: u64,
    pub recovery_rate: f64,
}

#[async_trait]
impl Hook for MetricsHook {
    fn name(&self) -> &str {
        "metrics"
    }

    fn events(&self) -> &'static [HookEvent] {
        &[
            HookEvent::PatternAdapted,
            HookEvent::MatchRecovered,
            HookEvent::ProjectLearned,
            HookEvent::PatternImproved,
        ]
    }

    async fn execute(&self, context: &HookContext<'_>) -> PadraoResult<()> {
        match context {
            HookContext::PatternAdapted { record, .. } => {
                self.adaptations.fetch_add(1, Ordering::Relaxed);
                if record.changed {
                    self.rule_changes.fetch_add(1, Ordering::Relaxed);
                }
            }
            HookContext::MatchRecovered {
                recovered, success, ..
            } => {
                if *success {
                    self.recoveries.fetch_add(1, Ordering::Relaxed);
                    self.recovered_instances
                        .fetch_add(*recovered as u64, Ordering::Relaxed);
                } else {
                    self.failed_recoveries.fetch_add(1, Ordering::Relaxed);
                }
            }
            HookContext::ProjectLearned { .. } => {
                self.projects.fetch_add(1, Ordering::Relaxed);
            }
            HookContext::PatternImproved { .. } => {
                self.improvements.fetch_add(1, Ordering::Relaxed);
            }
            HookContext::Shutdown { .. } => {}
        }

        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// HealthHook
// ═══════════════════════════════════════════════════════════════════════════

/// Estado de um componente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentStatus {
    Healthy,
    Degraded,
    Shutdown,
}

impl std::fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComponentStatus::Healthy => write!(f, "healthy"),
            ComponentStatus::Degraded => write!(f, "degraded"),
            ComponentStatus::Shutdown => write!(f, "shutdown"),
        }
    }
}

/// Entrada do quadro de saúde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub updated_at: DateTime<Utc>,
}

/// Quadro de saúde compartilhado.
///
/// Componentes de padrão usam a chave `pattern:<nome>`; o learner usa `learner`.
#[derive(Debug, Clone, Default)]
pub struct HealthBoard {
    inner: Arc<RwLock<BTreeMap<String, ComponentHealth>>>,
}

impl HealthBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, component: impl Into<String>, status: ComponentStatus) {
        self.inner.write().await.insert(
            component.into(),
            ComponentHealth {
                status,
                updated_at: Utc::now(),
            },
        );
    }

    pub async fn status(&self, component: &str) -> Option<ComponentStatus> {
        self.inner.read().await.get(component).map(|h| h.status)
    }

    /// Cópia do quadro inteiro.
    pub async fn snapshot(&self) -> BTreeMap<String, ComponentHealth> {
        self.inner.read().await.clone()
    }
}

/// Hook que alimenta um [`HealthBoard`].
#[derive(Debug, Clone, Default)]
pub struct HealthHook {
    board: HealthBoard,
}

impl HealthHook {
    pub fn new(board: HealthBoard) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &HealthBoard {
        &self.board
    }
}

#[async_trait]
impl Hook for HealthHook {
    fn name(&self) -> &str {
        "health"
    }

    fn events(&self) -> &'static [HookEvent] {
        &[
            HookEvent::MatchRecovered,
            HookEvent::ProjectLearned,
            HookEvent::PatternImproved,
            HookEvent::Shutdown,
        ]
    }

    async fn execute(&self, context: &HookContext<'_>) -> PadraoResult<()> {
        match context {
            HookContext::MatchRecovered {
                pattern, success, ..
            } => {
                let status = if *success {
                    ComponentStatus::Healthy
                } else {
                    ComponentStatus::Degraded
                };
                self.board.set(format!("pattern:{}", pattern), status).await;
            }
            HookContext::ProjectLearned { .. } => {
                self.board.set("learner", ComponentStatus::Healthy).await;
            }
            HookContext::PatternImproved { pattern, .. } => {
                self.board
                    .set(format!("pattern:{}", pattern), ComponentStatus::Healthy)
                    .await;
            }
            HookContext::Shutdown { component } => {
                self.board.set(*component, ComponentStatus::Shutdown).await;
            }
            HookContext::PatternAdapted { .. } => {}
        }

        Ok(())
    }
}
