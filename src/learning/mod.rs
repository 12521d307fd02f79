//! Aprendizado entre projetos.
//!
//! O [`CrossProjectLearner`] roda os padrões sobre os arquivos de cada projeto,
//! agrupa as instâncias encontradas por similaridade e generaliza cada grupo em
//! uma regex. As regex viram variações oferecidas aos padrões e, sob demanda,
//! regras instaladas (`apply_improvements`).
//!
//! ## Persistência
//!
//! O estado aprendido ([`InsightsSnapshot`]) é gravado por um [`InsightsStore`]:
//! JSON por padrão, SQLite com a feature `sqlite`.

mod export;
pub mod generalize;
mod insights;
mod learner;
mod scheduler;
pub mod similarity;
mod store;

pub use export::{format_insights, ImportResult, InsightsExport, EXPORT_VERSION};
pub use insights::{
    InsightsSnapshot, LearnerMetrics, PatternImprovement, ProjectInsight, REGEX_IMPROVEMENT,
};
pub use learner::{
    CrossProjectLearner, LearnReport, LearnedInstance, LearnerSettings, SourceFile,
    LEARNER_COMPONENT,
};
pub use scheduler::{LearningScheduler, ShutdownReport};
pub use similarity::SimilarityThresholds;
#[cfg(feature = "sqlite")]
pub use store::SqliteStore;
pub use store::{open_store, InsightsStore, JsonFileStore, MemoryStore};
