//! Cache LRU para resultados de match.
//!
//! Cada padrão mantém seu próprio cache limitado, evitando reaplicar a mesma
//! regra ao mesmo texto no mesmo contexto.

mod lru;

pub use lru::{CacheStats, CachedMatches, MatchCache, DEFAULT_CAPACITY};
