//! Regras de padrão: consulta estrutural ou expressão regular.

use regex::{Regex, RegexBuilder};

use crate::types::{MatchError, MatchInstance};

/// Expressão regular compilada junto com seu texto de origem.
///
/// Compilada em modo multi-linha com `.` casando quebras de linha.
#[derive(Debug, Clone)]
pub struct TextRule {
    source: String,
    regex: Regex,
}

impl TextRule {
    /// Compila uma regra textual.
    pub fn compile(source: &str) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(source)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()?;
        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Aplica a regra, falhando se passar de `limit` instâncias.
    pub fn find_all(&self, text: &str, limit: usize) -> Result<Vec<MatchInstance>, MatchError> {
        let names: Vec<Option<&str>> = self.regex.capture_names().collect();
        let mut found = Vec::new();

        for caps in self.regex.captures_iter(text) {
            if found.len() >= limit {
                return Err(MatchError::match_limit(limit));
            }
            if let Some(instance) = MatchInstance::from_captures(&caps, &names) {
                found.push(instance);
            }
        }

        Ok(found)
    }
}

impl PartialEq for TextRule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Regra de um padrão, decidida uma única vez na construção.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// Consulta opaca, executada pelo motor estrutural.
    Structural(String),
    /// Expressão regular executada pelo matcher próprio.
    Textual(TextRule),
}

impl Rule {
    /// Texto da regra.
    pub fn as_str(&self) -> &str {
        match self {
            Rule::Structural(query) => query,
            Rule::Textual(rule) => rule.as_str(),
        }
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Rule::Structural(_))
    }
}

/// Versão mais permissiva de uma regex: `+`→`*`, `{2,}`→`*`, sem âncoras.
pub fn relaxed(rule: &str) -> String {
    rule.replace("{2,}", "*")
        .replace('+', "*")
        .replace(['^', '$'], "")
}

/// Versão mais específica de uma regex: curingas gulosos não atravessam linhas.
pub fn more_specific(rule: &str) -> String {
    rule.replace(".*", "[^\\n]*")
        .replace(".+", "[^\\n]+")
        .replace("\\w+", "[a-zA-Z_][a-zA-Z0-9_]*")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_multiline() {
        let rule = TextRule::compile(r"^def (\w+)").unwrap();
        let found = rule.find_all("x = 1\ndef run():\ndef stop():", 100).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].groups[0].as_deref(), Some("run"));
        assert_eq!(found[0].start, 6);
    }

    #[test]
    fn test_compile_invalid() {
        assert!(TextRule::compile("get_(").is_err());
    }

    #[test]
    fn test_match_limit() {
        let rule = TextRule::compile("a").unwrap();
        let err = rule.find_all("aaaa", 3).unwrap_err();
        assert!(err.message().contains("match limit"));
        assert_eq!(rule.find_all("aaa", 3).unwrap().len(), 3);
    }

    #[test]
    fn test_relaxed() {
        assert_eq!(relaxed(r"^\d+x{2,}$"), r"\d*x*");
    }

    #[test]
    fn test_more_specific() {
        assert_eq!(more_specific(r"def \w+.*"), r"def [a-zA-Z_][a-zA-Z0-9_]*[^\n]*");
    }

    #[test]
    fn test_rule_as_str() {
        let textual = Rule::Textual(TextRule::compile("get_[a-z]+").unwrap());
        let structural = Rule::Structural("(identifier) @id".to_string());

        assert_eq!(textual.as_str(), "get_[a-z]+");
        assert!(!textual.is_structural());
        assert!(structural.is_structural());
    }
}
