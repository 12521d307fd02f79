//! Similaridade entre textos de matches e agrupamento guloso.

use std::collections::HashSet;
use std::hash::Hash;

use crate::types::config::LearningConfig;

/// Limiares de similaridade.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityThresholds {
    /// Diferença relativa de tamanho máxima (exclusiva).
    pub length_tolerance: f64,
    /// Jaccard de caracteres mínimo (exclusivo).
    pub char_similarity: f64,
    /// Jaccard de palavras mínimo (exclusivo).
    pub word_similarity: f64,
}

impl Default for SimilarityThresholds {
    fn default() -> Self {
        Self {
            length_tolerance: 0.3,
            char_similarity: 0.7,
            word_similarity: 0.5,
        }
    }
}

impl From<&LearningConfig> for SimilarityThresholds {
    fn from(config: &LearningConfig) -> Self {
        Self {
            length_tolerance: config.length_tolerance,
            char_similarity: config.char_similarity,
            word_similarity: config.word_similarity,
        }
    }
}

/// Índice de Jaccard; 0 quando ambos os conjuntos são vazios.
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Jaccard sobre o conjunto de caracteres.
pub fn char_similarity(a: &str, b: &str) -> f64 {
    let chars_a: HashSet<char> = a.chars().collect();
    let chars_b: HashSet<char> = b.chars().collect();
    jaccard(&chars_a, &chars_b)
}

/// Jaccard sobre palavras (sequências de alfanuméricos e `_`).
pub fn word_similarity(a: &str, b: &str) -> f64 {
    jaccard(&words(a), &words(b))
}

fn words(text: &str) -> HashSet<&str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
        .collect()
}

/// Decide se dois textos de match são parecidos.
///
/// Tamanhos próximos e (caracteres parecidos ou palavras parecidas).
/// Textos vazios nunca são parecidos.
pub fn similar_content(a: &str, b: &str, thresholds: &SimilarityThresholds) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    let len_diff = len_a.abs_diff(len_b) as f64 / len_a.max(len_b) as f64;
    if len_diff >= thresholds.length_tolerance {
        return false;
    }

    char_similarity(a, b) > thresholds.char_similarity
        || word_similarity(a, b) > thresholds.word_similarity
}

/// Agrupa textos por similaridade com a semente do grupo.
///
/// Passada única: cada item ainda livre abre um grupo e absorve os itens
/// livres seguintes parecidos com ele. Não é transitivo. Grupos menores que
/// `min_group_size` são descartados. Retorna índices.
pub fn group_by_content<S: AsRef<str>>(
    texts: &[S],
    thresholds: &SimilarityThresholds,
    min_group_size: usize,
) -> Vec<Vec<usize>> {
    let mut processed = vec![false; texts.len()];
    let mut groups = Vec::new();

    for seed in 0..texts.len() {
        if processed[seed] {
            continue;
        }
        processed[seed] = true;
        let mut group = vec![seed];

        for other in seed + 1..texts.len() {
            if !processed[other]
                && similar_content(texts[seed].as_ref(), texts[other].as_ref(), thresholds)
            {
                processed[other] = true;
                group.push(other);
            }
        }

        if group.len() >= min_group_size.max(1) {
            groups.push(group);
        }
    }

    groups
}
