//! Aprendizado em segundo plano com cancelamento cooperativo.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::learner::{CrossProjectLearner, LearnReport, SourceFile};

struct LearningTask {
    project_id: String,
    token: CancellationToken,
    handle: JoinHandle<Option<LearnReport>>,
}

/// Resultado do encerramento.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Tarefas que terminaram o aprendizado.
    pub completed: usize,
    /// Tarefas canceladas antes de começar.
    pub cancelled: usize,
    /// Tarefas abortadas por estourar o prazo.
    pub aborted: usize,
    /// Tarefas que entraram em pânico.
    pub failed: usize,
}

/// Agenda `learn_from_project` em tarefas tokio.
///
/// O learner fica atrás de um mutex, então as tarefas rodam uma de cada vez.
/// Uma tarefa cancelada antes de obter o learner não faz nada; uma tarefa já
/// em andamento roda até o fim ou até o prazo do encerramento.
pub struct LearningScheduler {
    learner: Arc<Mutex<CrossProjectLearner>>,
    tasks: HashMap<Uuid, LearningTask>,
    shutdown_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl LearningScheduler {
    pub fn new(learner: CrossProjectLearner, shutdown_timeout: Duration) -> Self {
        Self {
            learner: Arc::new(Mutex::new(learner)),
            tasks: HashMap::new(),
            shutdown_token: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    /// Learner compartilhado.
    pub fn learner(&self) -> Arc<Mutex<CrossProjectLearner>> {
        Arc::clone(&self.learner)
    }

    /// Agenda o aprendizado de um projeto.
    ///
    /// Tarefas já terminadas e não esperadas saem do registro aqui; o
    /// relatório delas só fica disponível via [`wait`](Self::wait) antes disso.
    pub fn submit(&mut self, project_id: impl Into<String>, files: Vec<SourceFile>) -> Uuid {
        self.prune_finished();

        let id = Uuid::new_v4();
        let project_id = project_id.into();
        let token = self.shutdown_token.child_token();

        let learner = Arc::clone(&self.learner);
        let task_token = token.clone();
        let task_project = project_id.clone();
        let handle = tokio::spawn(async move {
            let mut learner = tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    tracing::debug!(project_id = %task_project, "Learning task cancelled");
                    return None;
                }
                guard = learner.lock() => guard,
            };
            Some(learner.learn_from_project(&task_project, &files).await)
        });

        tracing::debug!(task_id = %id, project_id = %project_id, "Learning task submitted");
        self.tasks.insert(
            id,
            LearningTask {
                project_id,
                token,
                handle,
            },
        );
        id
    }

    fn prune_finished(&mut self) {
        self.tasks.retain(|id, task| {
            let finished = task.handle.is_finished();
            if finished {
                tracing::debug!(task_id = %id, project_id = %task.project_id, "Finished learning task dropped");
            }
            !finished
        });
    }

    /// Cancela uma tarefa que ainda não começou.
    pub fn cancel(&self, id: Uuid) -> bool {
        match self.tasks.get(&id) {
            Some(task) => {
                task.token.cancel();
                true
            }
            None => false,
        }
    }

    /// Espera uma tarefa. `None` se ela foi cancelada, falhou ou não existe.
    pub async fn wait(&mut self, id: Uuid) -> Option<LearnReport> {
        let task = self.tasks.remove(&id)?;
        match task.handle.await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(project_id = %task.project_id, error = %e, "Learning task failed");
                None
            }
        }
    }

    /// Tarefas ainda não terminadas.
    pub fn pending(&self) -> usize {
        self.tasks
            .values()
            .filter(|task| !task.handle.is_finished())
            .count()
    }

    /// Cancela tudo, espera cada tarefa com prazo, aborta as atrasadas e
    /// roda o `cleanup` do learner.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.shutdown_token.cancel();
        let mut report = ShutdownReport::default();

        for (id, mut task) in self.tasks.drain() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task.handle).await {
                Ok(Ok(Some(_))) => report.completed += 1,
                Ok(Ok(None)) => report.cancelled += 1,
                Ok(Err(e)) => {
                    tracing::error!(task_id = %id, error = %e, "Learning task failed");
                    report.failed += 1;
                }
                Err(_) => {
                    tracing::warn!(
                        task_id = %id,
                        project_id = %task.project_id,
                        "Learning task exceeded shutdown timeout, aborting"
                    );
                    task.handle.abort();
                    report.aborted += 1;
                }
            }
        }

        self.learner.lock().await.cleanup().await;

        tracing::info!(
            completed = report.completed,
            cancelled = report.cancelled,
            aborted = report.aborted,
            "Learning scheduler shut down"
        );
        report
    }
}

impl std::fmt::Debug for LearningScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LearningScheduler")
            .field("tasks", &self.tasks.len())
            .field("shutdown_timeout", &self.shutdown_timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::learning::store::MemoryStore;
    use crate::patterns::{BasePattern, PatternDefinition, QueryPattern};
    use crate::structural::StructuralEngine;
    use crate::types::{MatchError, MatchInstance};
    use async_trait::async_trait;

    fn create_test_learner(patterns: Vec<Box<dyn QueryPattern>>) -> CrossProjectLearner {
        CrossProjectLearner::new(patterns, Arc::new(MemoryStore::new()))
    }

    fn files() -> Vec<SourceFile> {
        vec![SourceFile::new("a.py", "get_name()")]
    }

    #[tokio::test]
    async fn test_submit_drops_finished_tasks() {
        let mut scheduler = LearningScheduler::new(create_test_learner(Vec::new()), Duration::from_secs(1));

        let first = scheduler.submit("p1", files());
        while scheduler.pending() > 0 {
            tokio::task::yield_now().await;
        }
        let second = scheduler.submit("p2", files());

        assert_eq!(scheduler.tasks.len(), 1);
        assert!(scheduler.tasks.contains_key(&second));
        assert!(scheduler.wait(first).await.is_none());
        assert!(scheduler.wait(second).await.is_some());
        assert!(scheduler.learner().lock().await.insights().is_trained("p1"));
    }

    #[tokio::test]
    async fn test_submit_and_wait() {
        let mut scheduler = LearningScheduler::new(create_test_learner(Vec::new()), Duration::from_secs(1));

        let id = scheduler.submit("p1", files());
        let report = scheduler.wait(id).await.unwrap();

        assert_eq!(report.project_id, "p1");
        assert!(scheduler.learner().lock().await.insights().is_trained("p1"));
        assert_eq!(scheduler.shutdown().await, ShutdownReport::default());
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let mut scheduler = LearningScheduler::new(create_test_learner(Vec::new()), Duration::from_secs(1));
        let learner = scheduler.learner();

        let guard = learner.lock().await;
        let id = scheduler.submit("p1", files());
        assert!(scheduler.cancel(id));
        drop(guard);

        assert!(scheduler.wait(id).await.is_none());
        assert!(!learner.lock().await.insights().is_trained("p1"));
        assert!(!scheduler.cancel(id));
    }

    #[tokio::test]
    async fn test_shutdown_cancels_queued_tasks() {
        let mut scheduler = LearningScheduler::new(create_test_learner(Vec::new()), Duration::from_secs(1));
        let learner = scheduler.learner();

        let guard = learner.lock().await;
        scheduler.submit("p1", files());
        scheduler.submit("p2", files());
        assert_eq!(scheduler.pending(), 2);
        drop(guard);

        let report = scheduler.shutdown().await;

        assert_eq!(report.cancelled, 2);
        assert!(!learner.lock().await.insights().is_trained("p1"));
    }

    /// Motor que demora mais que qualquer prazo de teste.
    struct SlowEngine;

    #[async_trait]
    impl StructuralEngine for SlowEngine {
        fn name(&self) -> &str {
            "slow"
        }

        fn supports_language(&self, _language_id: &str) -> bool {
            true
        }

        fn validate_query(&self, _language_id: &str, _query: &str) -> Result<(), String> {
            Ok(())
        }

        async fn run_query(
            &self,
            _language_id: &str,
            _query: &str,
            _source: &str,
        ) -> Result<Vec<MatchInstance>, MatchError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_shutdown_aborts_slow_task() {
        let base = BasePattern::new(PatternDefinition::new("slow", "(call)"), Arc::new(SlowEngine))
            .unwrap();
        let learner = create_test_learner(vec![Box::new(base)]);
        let mut scheduler = LearningScheduler::new(learner, Duration::from_millis(50));

        scheduler.submit("p1", files());
        // deixa a tarefa obter o learner
        tokio::time::sleep(Duration::from_millis(20)).await;

        let report = scheduler.shutdown().await;

        assert_eq!(report.aborted, 1);
        assert_eq!(report.completed, 0);
    }
}
