//! Resultados de match e blocos candidatos.

use std::collections::{BTreeMap, HashMap};

use regex::Captures;
use serde::{Deserialize, Serialize};

/// Posição (linha, coluna) dentro do arquivo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// Região candidata de texto fornecida pelo extrator de blocos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedBlock {
    pub content: String,
    pub start_point: Point,
    pub end_point: Point,
    pub node_type: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    pub confidence: f64,
}

impl ExtractedBlock {
    /// Cria um bloco com posições zeradas e confiança total.
    pub fn new(content: impl Into<String>, node_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            start_point: Point::default(),
            end_point: Point::default(),
            node_type: node_type.into(),
            metadata: HashMap::new(),
            confidence: 1.0,
        }
    }

    /// Define as posições inicial e final.
    pub fn at(mut self, start: Point, end: Point) -> Self {
        self.start_point = start;
        self.end_point = end;
        self
    }
}

/// Origem de um match feito dentro de um bloco.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOrigin {
    pub node_type: String,
    pub start_point: Point,
}

/// Uma aplicação bem-sucedida de uma regra.
///
/// `start`/`end` são offsets em bytes dentro da unidade casada (bloco ou fonte inteira).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInstance {
    pub text: String,
    pub start: usize,
    pub end: usize,

    /// Capturas posicionais; `None` quando o grupo não participou.
    #[serde(default)]
    pub groups: Vec<Option<String>>,

    #[serde(default)]
    pub named_groups: BTreeMap<String, String>,

    /// Campos produzidos pelo extrator do padrão.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<BlockOrigin>,

    /// Produzido pelo caminho de recuperação.
    #[serde(default)]
    pub recovered: bool,
}

impl MatchInstance {
    /// Cria um match simples, sem capturas.
    pub fn new(text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            text: text.into(),
            start,
            end,
            groups: Vec::new(),
            named_groups: BTreeMap::new(),
            fields: serde_json::Map::new(),
            block: None,
            recovered: false,
        }
    }

    /// Constrói a partir das capturas de uma regex.
    pub(crate) fn from_captures(caps: &Captures<'_>, names: &[Option<&str>]) -> Option<Self> {
        let whole = caps.get(0)?;
        let mut instance = Self::new(whole.as_str(), whole.start(), whole.end());

        instance.groups = (1..caps.len())
            .map(|i| caps.get(i).map(|m| m.as_str().to_string()))
            .collect();

        for name in names.iter().flatten() {
            if let Some(m) = caps.name(name) {
                instance
                    .named_groups
                    .insert((*name).to_string(), m.as_str().to_string());
            }
        }

        Some(instance)
    }

    /// Marca o match como produzido dentro de um bloco.
    pub fn within(mut self, block: &ExtractedBlock) -> Self {
        self.block = Some(BlockOrigin {
            node_type: block.node_type.clone(),
            start_point: block.start_point,
        });
        self
    }

    /// Desloca os offsets (usado ao juntar resultados de chunks).
    pub fn shifted(mut self, offset: usize) -> Self {
        self.start += offset;
        self.end += offset;
        self
    }
}
