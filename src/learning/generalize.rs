//! Generalização de regras a partir de exemplos, e fusão de variações.

use regex::RegexBuilder;

/// Máximo de exemplos usados para derivar prefixo/sufixo.
pub const MAX_EXAMPLES: usize = 5;

const ALPHA_CLASS: &str = "[a-zA-Z]+";
const DIGIT_CLASS: &str = r"\d+";
const WORD_CLASS: &str = r"\w+";
const ANY_CLASS: &str = r"[^\s]*";

/// Gera uma regex que casa todos os exemplos: `escape(prefixo) + classe + escape(sufixo)`.
///
/// Usa no máximo `max_examples` exemplos para derivar a regex, mas a aceita
/// apenas se ela casar *inteira* com todos os exemplos recebidos.
pub fn generate_regex_from_examples<S: AsRef<str>>(
    examples: &[S],
    max_examples: usize,
) -> Option<String> {
    if examples.len() < 2 {
        return None;
    }

    let sample: Vec<&str> = examples
        .iter()
        .take(max_examples.max(2))
        .map(AsRef::as_ref)
        .collect();

    let prefix = common_prefix(sample.iter().copied());
    let reversed: Vec<String> = sample.iter().map(|s| s.chars().rev().collect()).collect();
    let suffix: String = common_prefix(reversed.iter().map(String::as_str))
        .chars()
        .rev()
        .collect();

    let prefix_chars = prefix.chars().count();
    let suffix_chars = suffix.chars().count();
    let middles: Vec<String> = sample
        .iter()
        .map(|ex| {
            let chars: Vec<char> = ex.chars().collect();
            let end = chars.len().saturating_sub(suffix_chars);
            if prefix_chars >= end {
                String::new()
            } else {
                chars[prefix_chars..end].iter().collect()
            }
        })
        .collect();

    let class = classify_middles(&middles);
    let candidate = format!("{}{}{}", regex::escape(&prefix), class, regex::escape(&suffix));

    let verifier = RegexBuilder::new(&format!("^(?:{})$", candidate)).build().ok()?;
    if examples.iter().all(|ex| verifier.is_match(ex.as_ref())) {
        Some(candidate)
    } else {
        tracing::debug!(candidate = %candidate, "Generalized rule rejected");
        None
    }
}

fn classify_middles(middles: &[String]) -> &'static str {
    let all = |pred: fn(char) -> bool| {
        middles
            .iter()
            .all(|m| !m.is_empty() && m.chars().all(pred))
    };

    if all(char::is_alphanumeric) {
        if all(char::is_alphabetic) {
            ALPHA_CLASS
        } else if all(|c| c.is_ascii_digit()) {
            DIGIT_CLASS
        } else {
            WORD_CLASS
        }
    } else {
        ANY_CLASS
    }
}

fn common_prefix<'a>(mut items: impl Iterator<Item = &'a str>) -> String {
    let Some(first) = items.next() else {
        return String::new();
    };
    let mut prefix: Vec<char> = first.chars().collect();

    for item in items {
        let shared = prefix
            .iter()
            .zip(item.chars())
            .take_while(|(a, b)| **a == *b)
            .count();
        prefix.truncate(shared);
    }

    prefix.into_iter().collect()
}

/// Pontuação heurística de uma variação: `len + '(' + '[' + '|'`.
pub fn score_variation(variation: &str) -> usize {
    variation.len()
        + variation
            .chars()
            .filter(|c| matches!(c, '(' | '[' | '|'))
            .count()
}

/// Verifica se `variation` já foi fundida em `current` por [`merge_rules`].
pub fn already_merged(current: &str, variation: &str) -> bool {
    current == variation || current.contains(&format!("|{})", variation))
}

/// Escolhe a variação de maior pontuação ainda não presente na regra atual.
///
/// Empates ficam com a primeira.
pub fn select_best_variation<'a>(variations: &'a [String], current: &str) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;

    for variation in variations {
        if variation.is_empty() || already_merged(current, variation) {
            continue;
        }
        let score = score_variation(variation);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((variation, score));
        }
    }

    best.map(|(variation, _)| variation)
}

/// Funde duas regras por alternância.
///
/// - iguais → original
/// - original vazia → variação
/// - caso contrário → `(?:original|variação)`
pub fn merge_rules(original: &str, variation: &str) -> String {
    if original == variation {
        original.to_string()
    } else if original.is_empty() {
        variation.to_string()
    } else {
        format!("(?:{}|{})", original, variation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_getters_generalize() {
        let examples = ["get_name", "get_age", "get_id"];
        assert_eq!(
            generate_regex_from_examples(&examples, MAX_EXAMPLES).as_deref(),
            Some("get_[a-zA-Z]+")
        );
    }

    #[test]
    fn test_digit_and_word_classes() {
        assert_eq!(
            generate_regex_from_examples(&["v1.", "v22.", "v3."], MAX_EXAMPLES).as_deref(),
            Some(r"v\d+\.")
        );
        assert_eq!(
            generate_regex_from_examples(&["id_a1", "id_b2"], MAX_EXAMPLES).as_deref(),
            Some(r"id_\w+")
        );
    }

    #[test]
    fn test_empty_middle_uses_any_class() {
        assert_eq!(
            generate_regex_from_examples(&["ab", "ab!"], MAX_EXAMPLES).as_deref(),
            Some(r"ab[^\s]*")
        );
    }

    #[test]
    fn test_overlapping_prefix_and_suffix() {
        // prefixo "ab" e sufixo "ab" se sobrepõem em "ab": "ab[^\s]*ab" não casa "ab"
        assert!(generate_regex_from_examples(&["ab", "abab"], MAX_EXAMPLES).is_none());
    }

    #[test]
    fn test_needs_two_examples() {
        assert!(generate_regex_from_examples(&["get_name"], MAX_EXAMPLES).is_none());
        assert!(generate_regex_from_examples::<&str>(&[], MAX_EXAMPLES).is_none());
    }

    #[test]
    fn test_rejects_candidate_failing_unsampled_example() {
        // a amostra de 2 gera "a[a-zA-Z]+"; o terceiro exemplo tem espaço
        let examples = ["ab", "ac", "a b"];
        assert!(generate_regex_from_examples(&examples, 2).is_none());
    }

    #[test]
    fn test_merge_identity_laws() {
        assert_eq!(merge_rules("get_id", "get_id"), "get_id");
        assert_eq!(merge_rules("", "get_[a-z]+"), "get_[a-z]+");
        assert_eq!(merge_rules("get_id", "set_id"), "(?:get_id|set_id)");
    }

    #[test]
    fn test_score_variation() {
        assert_eq!(score_variation("a|b"), 4);
        assert_eq!(score_variation("(x)[y]"), 8);
    }

    #[test]
    fn test_select_best_variation() {
        let variations = vec!["ab".to_string(), "[a-z]+".to_string(), "xy".to_string()];

        assert_eq!(select_best_variation(&variations, ""), Some("[a-z]+"));
        assert_eq!(select_best_variation(&variations, "[a-z]+"), Some("ab"));
        // já fundida
        assert_eq!(select_best_variation(&variations, "(?:q|[a-z]+)"), Some("ab"));
        assert_eq!(select_best_variation(&[], "x"), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_generalization_is_sound(examples in prop::collection::vec("[a-z_0-9. -]{0,12}", 2..8)) {
            if let Some(rule) = generate_regex_from_examples(&examples, MAX_EXAMPLES) {
                let re = regex::Regex::new(&format!("^(?:{})$", rule)).unwrap();
                for ex in &examples {
                    prop_assert!(re.is_match(ex), "{} does not match {}", rule, ex);
                }
            }
        }
    }
}
