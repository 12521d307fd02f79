//! Sistema de hooks do Padrão.
//!
//! Hooks observam pontos do ciclo de vida de padrões e do aprendizado:
//!
//! - `pattern_adapted`: Um padrão tentou se adaptar a um contexto
//! - `match_recovered`: Um match falhou e passou pela recuperação
//! - `project_learned`: O learner terminou de processar um projeto
//! - `pattern_improved`: Uma melhoria aprendida foi instalada
//! - `shutdown`: Um componente foi encerrado
//!
//! Falhas de hooks são logadas e nunca interrompem o fluxo principal.

mod builtin;

pub use builtin::{
    ComponentHealth, ComponentStatus, HealthBoard, HealthHook, LoggingHook, Metrics, MetricsHook,
};

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::learning::{LearnReport, PatternImprovement};
use crate::patterns::AdaptationRecord;
use crate::types::MatchErrorKind;
use crate::PadraoResult;

// ═══════════════════════════════════════════════════════════════════════════
// Tipos de eventos
// ═══════════════════════════════════════════════════════════════════════════

/// Evento que dispara um hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    /// Tentativa de adaptação de um padrão.
    PatternAdapted,

    /// Recuperação após erro de match.
    MatchRecovered,

    /// Projeto processado pelo learner.
    ProjectLearned,

    /// Melhoria instalada em um padrão.
    PatternImproved,

    /// Componente encerrado.
    Shutdown,
}

impl HookEvent {
    /// Todos os eventos.
    pub const ALL: [HookEvent; 5] = [
        HookEvent::PatternAdapted,
        HookEvent::MatchRecovered,
        HookEvent::ProjectLearned,
        HookEvent::PatternImproved,
        HookEvent::Shutdown,
    ];
}

impl std::fmt::Display for HookEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HookEvent::PatternAdapted => write!(f, "pattern_adapted"),
            HookEvent::MatchRecovered => write!(f, "match_recovered"),
            HookEvent::ProjectLearned => write!(f, "project_learned"),
            HookEvent::PatternImproved => write!(f, "pattern_improved"),
            HookEvent::Shutdown => write!(f, "shutdown"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Contexto de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Contexto passado para hooks.
#[derive(Debug)]
pub enum HookContext<'a> {
    /// Contexto para pattern_adapted.
    PatternAdapted {
        /// Nome do padrão.
        pattern: &'a str,
        /// Registro da tentativa.
        record: &'a AdaptationRecord,
    },

    /// Contexto para match_recovered.
    MatchRecovered {
        /// Nome do padrão.
        pattern: &'a str,
        /// Tipo do erro original.
        kind: MatchErrorKind,
        /// Instâncias recuperadas.
        recovered: usize,
        /// Se a recuperação terminou sem erro.
        success: bool,
    },

    /// Contexto para project_learned.
    ProjectLearned {
        project_id: &'a str,
        report: &'a LearnReport,
    },

    /// Contexto para pattern_improved.
    PatternImproved {
        pattern: &'a str,
        improvement: &'a PatternImprovement,
    },

    /// Contexto para shutdown.
    Shutdown {
        /// Nome do componente encerrado.
        component: &'a str,
    },
}

impl<'a> HookContext<'a> {
    /// Retorna o evento correspondente ao contexto.
    pub fn event(&self) -> HookEvent {
        match self {
            HookContext::PatternAdapted { .. } => HookEvent::PatternAdapted,
            HookContext::MatchRecovered { .. } => HookEvent::MatchRecovered,
            HookContext::ProjectLearned { .. } => HookEvent::ProjectLearned,
            HookContext::PatternImproved { .. } => HookEvent::PatternImproved,
            HookContext::Shutdown { .. } => HookEvent::Shutdown,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Trait Hook
// ═══════════════════════════════════════════════════════════════════════════

/// Trait para hooks customizáveis.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Nome do hook.
    fn name(&self) -> &str;

    /// Eventos que disparam este hook.
    fn events(&self) -> &'static [HookEvent];

    /// Executa o hook.
    async fn execute(&self, context: &HookContext<'_>) -> PadraoResult<()>;
}

/// Permite registrar um hook compartilhado e continuar lendo seu estado.
#[async_trait]
impl<T: Hook + ?Sized> Hook for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn events(&self) -> &'static [HookEvent] {
        (**self).events()
    }

    async fn execute(&self, context: &HookContext<'_>) -> PadraoResult<()> {
        (**self).execute(context).await
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Sistema de hooks
// ═══════════════════════════════════════════════════════════════════════════

/// Gerenciador de hooks.
#[derive(Default)]
pub struct HookSystem {
    hooks: HashMap<HookEvent, Vec<Arc<dyn Hook>>>,
}

impl HookSystem {
    /// Cria um novo sistema de hooks vazio.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cria um sistema com hooks padrão (logging).
    pub fn with_defaults() -> Self {
        let mut system = Self::new();
        system.register(Box::new(LoggingHook));
        system
    }

    /// Registra um hook para todos os eventos que ele declara.
    pub fn register(&mut self, hook: Box<dyn Hook>) {
        let hook: Arc<dyn Hook> = Arc::from(hook);
        for event in hook.events() {
            tracing::debug!(
                hook_name = hook.name(),
                event = %event,
                "Registering hook"
            );
            self.hooks.entry(*event).or_default().push(Arc::clone(&hook));
        }
    }

    /// Dispara os hooks do evento do contexto, em ordem de registro.
    pub async fn emit(&self, context: &HookContext<'_>) {
        let event = context.event();
        let Some(hooks) = self.hooks.get(&event) else {
            return;
        };

        for hook in hooks {
            if let Err(e) = hook.execute(context).await {
                tracing::warn!(
                    hook_name = hook.name(),
                    event = %event,
                    error = %e,
                    "Hook failed"
                );
            }
        }
    }

    /// Retorna o número total de registros (um hook conta uma vez por evento).
    pub fn count(&self) -> usize {
        self.hooks.values().map(Vec::len).sum()
    }

    /// Retorna o número de hooks para um evento específico.
    pub fn count_for_event(&self, event: HookEvent) -> usize {
        self.hooks.get(&event).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for HookSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HookSystem").field("count", &self.count()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PadraoError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Hook de teste que conta execuções
    struct CountingHook {
        name: String,
        events: &'static [HookEvent],
        count: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingHook {
        fn new(name: &str, events: &'static [HookEvent], count: Arc<AtomicUsize>) -> Self {
            Self {
                name: name.to_string(),
                events,
                count,
                fail: false,
            }
        }
    }

    #[async_trait]
    impl Hook for CountingHook {
        fn name(&self) -> &str {
            &self.name
        }

        fn events(&self) -> &'static [HookEvent] {
            self.events
        }

        async fn execute(&self, _context: &HookContext<'_>) -> PadraoResult<()> {
            self.count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(PadraoError::other("hook failure"));
            }
            Ok(())
        }
    }

    #[test]
    fn test_hook_system_new() {
        let system = HookSystem::new();
        assert_eq!(system.count(), 0);
    }

    #[test]
    fn test_hook_system_with_defaults() {
        let system = HookSystem::with_defaults();
        assert!(system.count() > 0);
        assert_eq!(system.count_for_event(HookEvent::Shutdown), 1);
    }

    #[test]
    fn test_hook_registration() {
        let mut system = HookSystem::new();
        let count = Arc::new(AtomicUsize::new(0));

        system.register(Box::new(CountingHook::new(
            "test",
            &[HookEvent::Shutdown, HookEvent::ProjectLearned],
            count,
        )));

        assert_eq!(system.count_for_event(HookEvent::Shutdown), 1);
        assert_eq!(system.count_for_event(HookEvent::ProjectLearned), 1);
        assert_eq!(system.count_for_event(HookEvent::PatternAdapted), 0);
        assert_eq!(system.count(), 2);
    }

    #[tokio::test]
    async fn test_emit_only_matching_event() {
        let mut system = HookSystem::new();
        let count = Arc::new(AtomicUsize::new(0));

        system.register(Box::new(CountingHook::new(
            "test",
            &[HookEvent::Shutdown],
            count.clone(),
        )));

        system.emit(&HookContext::Shutdown { component: "learner" }).await;
        system
            .emit(&HookContext::MatchRecovered {
                pattern: "p",
                kind: MatchErrorKind::TimeoutError,
                recovered: 1,
                success: true,
            })
            .await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failing_hook_does_not_stop_others() {
        let mut system = HookSystem::new();
        let count = Arc::new(AtomicUsize::new(0));

        let mut failing = CountingHook::new("failing", &[HookEvent::Shutdown], count.clone());
        failing.fail = true;
        system.register(Box::new(failing));
        system.register(Box::new(CountingHook::new(
            "after",
            &[HookEvent::Shutdown],
            count.clone(),
        )));

        system.emit(&HookContext::Shutdown { component: "x" }).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_event_display() {
        let names: Vec<String> = HookEvent::ALL.iter().map(ToString::to_string).collect();
        assert_eq!(
            names,
            vec![
                "pattern_adapted",
                "match_recovered",
                "project_learned",
                "pattern_improved",
                "shutdown"
            ]
        );
    }
}
