//! Fonte de blocos candidatos.
//!
//! Um extrator fatia o texto em regiões ([`ExtractedBlock`]) onde os padrões são
//! aplicados primeiro. Se não houver blocos, ou nenhum casar, o padrão é aplicado
//! ao texto inteiro.

use crate::types::{ExtractedBlock, Point};

/// Fornece blocos candidatos para uma linguagem.
pub trait BlockExtractor: Send + Sync {
    /// Extrai blocos do texto. Uma lista vazia significa "use o texto inteiro".
    fn extract(&self, language_id: &str, source: &str) -> Vec<ExtractedBlock>;
}

/// Extrator de parágrafos: blocos separados por linhas em branco.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlankLineExtractor;

impl BlockExtractor for BlankLineExtractor {
    fn extract(&self, _language_id: &str, source: &str) -> Vec<ExtractedBlock> {
        let mut blocks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut start_row = 0;

        for (row, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                if !current.is_empty() {
                    blocks.push(paragraph(&current, start_row));
                    current.clear();
                }
                continue;
            }
            if current.is_empty() {
                start_row = row;
            }
            current.push(line);
        }

        if !current.is_empty() {
            blocks.push(paragraph(&current, start_row));
        }

        blocks
    }
}

fn paragraph(lines: &[&str], start_row: usize) -> ExtractedBlock {
    let last = lines.last().map(|l| l.len()).unwrap_or(0);
    ExtractedBlock::new(lines.join("\n"), "paragraph").at(
        Point::new(start_row, 0),
        Point::new(start_row + lines.len() - 1, last),
    )
}
