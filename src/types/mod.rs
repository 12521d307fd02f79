//! Tipos compartilhados do Padrão.

pub mod config;
pub mod context;
pub mod errors;
pub mod language;
pub mod matches;

pub use context::{ParserKind, PatternContext};
pub use errors::{MatchError, MatchErrorKind, PadraoError, PadraoResult, PatternValidationError};
pub use matches::{BlockOrigin, ExtractedBlock, MatchInstance, Point};
