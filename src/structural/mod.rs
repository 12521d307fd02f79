//! Interface com o motor de consultas estruturais (AST).
//!
//! O Padrão não executa consultas estruturais: ele só decide, na construção de
//! cada padrão, se a regra vai para o motor ([`StructuralEngine::supports_language`])
//! ou para o matcher textual próprio, e valida a consulta antes do primeiro uso.

use async_trait::async_trait;

use crate::types::{MatchError, MatchInstance};

/// Motor externo de consultas estruturais.
#[async_trait]
pub trait StructuralEngine: Send + Sync {
    /// Nome do motor (para logs).
    fn name(&self) -> &str;

    /// Verifica se o motor sabe consultar esta linguagem.
    fn supports_language(&self, language_id: &str) -> bool;

    /// Valida (compila) uma consulta. Chamado uma vez, na construção do padrão.
    fn validate_query(&self, language_id: &str, query: &str) -> Result<(), String>;

    /// Executa a consulta sobre o texto.
    async fn run_query(
        &self,
        language_id: &str,
        query: &str,
        source: &str,
    ) -> Result<Vec<MatchInstance>, MatchError>;
}

/// Motor que não suporta nenhuma linguagem: toda regra vira textual.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStructuralEngine;

#[async_trait]
impl StructuralEngine for NoStructuralEngine {
    fn name(&self) -> &str {
        "none"
    }

    fn supports_language(&self, _language_id: &str) -> bool {
        false
    }

    fn validate_query(&self, language_id: &str, _query: &str) -> Result<(), String> {
        Err(format!("no structural support for '{}'", language_id))
    }

    async fn run_query(
        &self,
        language_id: &str,
        _query: &str,
        _source: &str,
    ) -> Result<Vec<MatchInstance>, MatchError> {
        Err(MatchError::new(format!(
            "no structural support for '{}'",
            language_id
        )))
    }
}
