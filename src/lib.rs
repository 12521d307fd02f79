//! # Padrão
//!
//! Motor de casamento de padrões adaptativo com aprendizado entre projetos.
//!
//! Cada padrão carrega uma regra (regex ou consulta estrutural), mede o próprio
//! desempenho por contexto, se adapta com variações aprendidas e se recupera
//! de falhas sem nunca propagar erro para quem chama `matches`.
//!
//! ## Módulos
//!
//! - [`patterns`] - Padrões base, adaptativo e resiliente
//! - [`learning`] - Aprendizado entre projetos e persistência
//! - [`hooks`] - Sistema de hooks para observar o ciclo de vida
//! - [`cache`] - Cache LRU de resultados
//! - [`blocks`] - Extração de blocos de código
//! - [`structural`] - Interface com o motor estrutural
//! - [`cli`] - Interface de linha de comando
//! - [`types`] - Tipos compartilhados

pub mod blocks;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod hooks;
pub mod learning;
pub mod patterns;
pub mod structural;
pub mod types;

pub use types::config::Config;
pub use types::errors::{PadraoError, PadraoResult};
