//! Contexto situacional de um match.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::matches::ExtractedBlock;

/// Tipo de parser que produziu (ou produziria) a entrada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserKind {
    /// Parser estrutural (tree-sitter).
    TreeSitter,
    /// Parser próprio, baseado em texto.
    Custom,
    /// Desconhecido.
    #[default]
    Unknown,
}

impl std::fmt::Display for ParserKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParserKind::TreeSitter => write!(f, "tree_sitter"),
            ParserKind::Custom => write!(f, "custom"),
            ParserKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Dados efêmeros sobre onde e como um padrão está sendo aplicado.
///
/// Criado por chamada de match. A chave de contexto ([`PatternContext::context_key`])
/// serve apenas como balde de métricas.
#[derive(Debug, Clone)]
pub struct PatternContext {
    /// Caminho ou identificador do arquivo.
    pub file_location: String,

    /// Dependências conhecidas do arquivo.
    pub dependencies: BTreeSet<String>,

    /// Padrões conhecidos do projeto.
    pub project_patterns: Vec<String>,

    /// Tipo de parser.
    pub parser_kind: ParserKind,

    /// Linguagem do arquivo.
    pub language_id: String,

    /// Blocos candidatos já extraídos.
    pub blocks: Vec<ExtractedBlock>,

    /// Metadados livres.
    pub metadata: HashMap<String, serde_json::Value>,

    /// Momento da criação (ou da última atualização de metadados).
    pub updated_at: DateTime<Utc>,
}

impl PatternContext {
    /// Cria um novo contexto.
    pub fn new(
        file_location: impl Into<String>,
        language_id: impl Into<String>,
        parser_kind: ParserKind,
    ) -> Self {
        Self {
            file_location: file_location.into(),
            dependencies: BTreeSet::new(),
            project_patterns: Vec::new(),
            parser_kind,
            language_id: language_id.into(),
            blocks: Vec::new(),
            metadata: HashMap::new(),
            updated_at: Utc::now(),
        }
    }

    /// Define as dependências.
    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Define os padrões do projeto.
    pub fn with_project_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.project_patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Define os blocos candidatos.
    pub fn with_blocks(mut self, blocks: Vec<ExtractedBlock>) -> Self {
        self.blocks = blocks;
        self
    }

    /// Troca o tipo de parser.
    pub fn with_parser_kind(mut self, parser_kind: ParserKind) -> Self {
        self.parser_kind = parser_kind;
        self
    }

    /// Chave do balde de métricas:
    /// `location:|deps|:|project_patterns|:parser_kind:language_id`.
    pub fn context_key(&self) -> String {
        format!(
            "{}:{}:{}:{}:{}",
            self.file_location,
            self.dependencies.len(),
            self.project_patterns.len(),
            self.parser_kind,
            self.language_id
        )
    }

    /// Atualiza um metadado e o timestamp.
    pub fn update_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
        self.updated_at = Utc::now();
    }
}
