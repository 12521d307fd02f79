//! Cache LRU para resultados de match.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use lru::LruCache;
use sha2::{Digest, Sha256};

use crate::types::{MatchInstance, ParserKind};

/// Capacidade padrão do cache de um padrão.
pub const DEFAULT_CAPACITY: usize = 1000;

/// Resultado em cache.
#[derive(Debug, Clone)]
pub struct CachedMatches {
    /// Matches produzidos.
    pub matches: Vec<MatchInstance>,

    /// Momento em que foi cacheado.
    pub cached_at: DateTime<Utc>,
}

impl CachedMatches {
    /// Cria um novo resultado em cache.
    pub fn new(matches: Vec<MatchInstance>) -> Self {
        Self {
            matches,
            cached_at: Utc::now(),
        }
    }

    /// Verifica se o cache expirou.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        let elapsed = Utc::now()
            .signed_duration_since(self.cached_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        elapsed > ttl
    }
}

/// Estatísticas do cache.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Número atual de entradas.
    pub size: usize,

    /// Capacidade máxima.
    pub capacity: usize,

    /// Número de acertos (cache hits).
    pub hits: u64,

    /// Número de erros (cache misses).
    pub misses: u64,
}

impl CacheStats {
    /// Calcula a taxa de acerto.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Cache LRU de matches de um único padrão.
///
/// A regra do padrão não entra na chave: quem troca a regra deve chamar [`MatchCache::clear`].
pub struct MatchCache {
    cache: LruCache<String, CachedMatches>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MatchCache {
    /// Cria um novo cache.
    ///
    /// # Argumentos
    /// - `capacity`: Número máximo de entradas
    /// - `ttl`: Tempo de vida das entradas (`None` = sem expiração)
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(cap),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Cria um cache com configuração padrão (1000 entradas, sem expiração).
    pub fn default_config() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }

    /// Gera a chave `sha256(source):context_key:parser_kind`.
    pub fn cache_key(source: &str, context_key: &str, parser_kind: ParserKind) -> String {
        let digest = hex::encode(Sha256::digest(source.as_bytes()));
        format!("{}:{}:{}", digest, context_key, parser_kind)
    }

    /// Busca no cache.
    ///
    /// Retorna `None` se não encontrado ou se expirado.
    pub fn get(&mut self, key: &str) -> Option<Vec<MatchInstance>> {
        // peek não altera a ordem LRU
        let is_expired = self
            .cache
            .peek(key)
            .map(|c| self.ttl.is_some_and(|ttl| c.is_expired(ttl)));

        match is_expired {
            Some(true) => {
                self.cache.pop(key);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(false) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                self.cache.get(key).map(|c| c.matches.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insere no cache.
    pub fn insert(&mut self, key: String, matches: Vec<MatchInstance>) {
        self.cache.put(key, CachedMatches::new(matches));
    }

    /// Limpa todo o cache.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    /// Retorna estatísticas do cache.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.cache.len(),
            capacity: self.cache.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for MatchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MatchCache")
            .field("stats", &self.stats())
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_matches() -> Vec<MatchInstance> {
        vec![MatchInstance::new("get_name", 0, 8)]
    }

    #[test]
    fn test_cache_key_generation() {
        let key1 = MatchCache::cache_key("get_name()", "a.py:0:0:custom:python", ParserKind::Custom);
        let key2 = MatchCache::cache_key("get_name()", "a.py:0:0:custom:python", ParserKind::Custom);
        let key3 = MatchCache::cache_key("get_name()", "b.py:0:0:custom:python", ParserKind::Custom);
        let key4 = MatchCache::cache_key("get_name()", "a.py:0:0:custom:python", ParserKind::TreeSitter);

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_ne!(key1, key4);
        assert!(key1.ends_with(":a.py:0:0:custom:python:custom"));
    }

    #[test]
    fn test_cache_hit() {
        let mut cache = MatchCache::new(10, None);
        cache.insert("k".to_string(), create_test_matches());

        let cached = cache.get("k");
        assert_eq!(cached.unwrap()[0].text, "get_name");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cache_miss() {
        let mut cache = MatchCache::new(10, None);

        assert!(cache.get("nonexistent").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_cache_expiration() {
        let mut cache = MatchCache::new(10, Some(Duration::ZERO));
        cache.insert("k".to_string(), create_test_matches());

        std::thread::sleep(Duration::from_millis(5));

        assert!(cache.get("k").is_none());
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_cache_lru_eviction() {
        let mut cache = MatchCache::new(2, None);

        cache.insert("key1".to_string(), create_test_matches());
        cache.insert("key2".to_string(), create_test_matches());
        cache.insert("key3".to_string(), create_test_matches()); // evicta key1

        assert!(cache.get("key1").is_none());
        assert!(cache.get("key2").is_some());
        assert!(cache.get("key3").is_some());
    }

    #[test]
    fn test_cache_clear() {
        let mut cache = MatchCache::default_config();
        cache.insert("key1".to_string(), create_test_matches());

        cache.clear();

        assert!(cache.get("key1").is_none());
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn test_cache_stats_hit_rate() {
        let mut cache = MatchCache::new(10, None);
        cache.insert("key1".to_string(), Vec::new());

        cache.get("key1");
        cache.get("key2");
        cache.get("key1");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate() - 0.666).abs() < 0.01);
    }
}
