//! Tipos de erro do Padrão.
//!
//! Três níveis:
//! - [`PatternValidationError`]: rejeita padrões inválidos na construção.
//! - [`MatchError`]: falha em tempo de execução de um match, sempre recuperada localmente.
//! - [`PadraoError`]: erro geral da crate (config, IO, persistência).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tipo de resultado padrão do Padrão.
pub type PadraoResult<T> = Result<T, PadraoError>;

/// Erros possíveis no Padrão.
#[derive(Error, Debug)]
pub enum PadraoError {
    #[error("Erro de configuração: {0}")]
    Config(String),

    #[error("Erro de IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro ao parsear TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Erro ao serializar TOML: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Erro de JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Padrão inválido: {0}")]
    Validation(#[from] PatternValidationError),

    #[error("Erro de match: {0}")]
    Match(#[from] MatchError),

    #[error("Erro de persistência: {0}")]
    Persistence(String),

    #[cfg(feature = "sqlite")]
    #[error("Erro de SQLite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "cli")]
    #[error("Erro de entrada interativa: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(String),
}

impl PadraoError {
    /// Cria um erro genérico.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Cria um erro de configuração.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Cria um erro de persistência.
    pub fn persistence<S: Into<String>>(msg: S) -> Self {
        Self::Persistence(msg.into())
    }
}

/// Erro de validação levantado ao construir um padrão.
///
/// É fatal para o carregamento do catálogo: nenhum padrão inválido chega a ser usado.
#[derive(Error, Debug)]
pub enum PatternValidationError {
    #[error("padrão sem nome")]
    EmptyName,

    #[error("padrão '{name}' tem regra vazia")]
    EmptyRule { name: String },

    #[error("padrão '{name}' tem expressão regular inválida: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },

    #[error("padrão '{name}' tem consulta estrutural inválida: {message}")]
    InvalidStructuralQuery { name: String, message: String },

    #[error("padrão '{name}' tem confiança fora de [0, 1]: {value}")]
    InvalidConfidence { name: String, value: f64 },
}

/// Falha em tempo de execução durante um match.
///
/// Carrega apenas a mensagem; o tipo é derivado dela por [`MatchErrorKind::classify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct MatchError {
    message: String,
}

impl MatchError {
    /// Cria um erro de match a partir de uma mensagem.
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Erro de limite de matches excedido.
    pub fn match_limit(limit: usize) -> Self {
        Self::new(format!("match limit exceeded ({} instances)", limit))
    }

    /// Mensagem original.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Classificação da falha.
    pub fn kind(&self) -> MatchErrorKind {
        MatchErrorKind::classify(&self.message)
    }
}

const SYNTAX_MARKERS: [&str; 3] = ["syntax", "unexpected token", "parse error"];

/// Categorias de falha em tempo de execução.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchErrorKind {
    SyntaxError,
    TimeoutError,
    MemoryError,
    MatchLimitError,
    PartialMatchError,
    AmbiguousMatchError,
    RecursionError,
    UnknownError,
}

impl MatchErrorKind {
    /// Todas as categorias, na ordem de prioridade da classificação.
    pub const ALL: [MatchErrorKind; 8] = [
        MatchErrorKind::SyntaxError,
        MatchErrorKind::TimeoutError,
        MatchErrorKind::MemoryError,
        MatchErrorKind::MatchLimitError,
        MatchErrorKind::PartialMatchError,
        MatchErrorKind::AmbiguousMatchError,
        MatchErrorKind::RecursionError,
        MatchErrorKind::UnknownError,
    ];

    /// Classifica uma mensagem de erro por substring, sem diferenciar maiúsculas.
    ///
    /// A primeira regra que casar vence. Mensagens de parser ("unexpected token",
    /// "parse error") contam como erro de sintaxe.
    pub fn classify(message: &str) -> Self {
        let msg = message.to_lowercase();

        if SYNTAX_MARKERS.iter().any(|m| msg.contains(m)) {
            Self::SyntaxError
        } else if msg.contains("timeout") || msg.contains("time limit") {
            Self::TimeoutError
        } else if msg.contains("memory") {
            Self::MemoryError
        } else if msg.contains("match limit") {
            Self::MatchLimitError
        } else if msg.contains("partial") {
            Self::PartialMatchError
        } else if msg.contains("ambiguous") {
            Self::AmbiguousMatchError
        } else if msg.contains("recursion") {
            Self::RecursionError
        } else {
            Self::UnknownError
        }
    }
}

impl std::fmt::Display for MatchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchErrorKind::SyntaxError => write!(f, "syntax_error"),
            MatchErrorKind::TimeoutError => write!(f, "timeout_error"),
            MatchErrorKind::MemoryError => write!(f, "memory_error"),
            MatchErrorKind::MatchLimitError => write!(f, "match_limit_error"),
            MatchErrorKind::PartialMatchError => write!(f, "partial_match_error"),
            MatchErrorKind::AmbiguousMatchError => write!(f, "ambiguous_match_error"),
            MatchErrorKind::RecursionError => write!(f, "recursion_error"),
            MatchErrorKind::UnknownError => write!(f, "unknown_error"),
        }
    }
}
