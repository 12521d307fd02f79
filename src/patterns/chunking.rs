//! Janelas sobrepostas para matching em pedaços.

/// Uma janela `[start, end)` do texto original.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Divide `source` em janelas de `chunk_size` bytes que avançam `chunk_size - overlap`.
///
/// As bordas são ajustadas para limites de caractere UTF-8 (início para trás, fim
/// para frente). Para assim que uma janela termina em `source.len()`. Texto vazio
/// não gera janelas.
pub fn split_into_chunks(source: &str, chunk_size: usize, overlap: usize) -> Vec<Chunk<'_>> {
    let len = source.len();
    if len == 0 {
        return Vec::new();
    }
    if chunk_size == 0 {
        return vec![Chunk {
            start: 0,
            end: len,
            text: source,
        }];
    }

    let step = chunk_size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut i = 0;

    while i < len {
        let start = floor_boundary(source, i);
        let end = ceil_boundary(source, (i + chunk_size).min(len));

        chunks.push(Chunk {
            start,
            end,
            text: &source[start..end],
        });

        if end == len {
            break;
        }
        i += step;
    }

    chunks
}

fn floor_boundary(s: &str, mut idx: usize) -> usize {
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn ceil_boundary(s: &str, mut idx: usize) -> usize {
    while idx < s.len() && !s.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}
