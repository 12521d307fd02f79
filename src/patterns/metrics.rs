//! Métricas de desempenho de um padrão.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::ParserKind;

/// Amostras de tempo guardadas por série; as mais antigas saem primeiro.
pub const MAX_TIMING_SAMPLES: usize = 1000;

/// Desempenho de um padrão em um balde de contexto.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextPerformance {
    pub uses: u64,
    pub successes: u64,
    pub avg_time: f64,
}

impl ContextPerformance {
    pub fn success_rate(&self) -> f64 {
        ratio(self.successes, self.uses)
    }
}

/// Desempenho de um padrão por tipo de parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParserStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    pub avg_time: f64,
}

impl ParserStats {
    pub fn success_rate(&self) -> f64 {
        ratio(self.successful, self.total)
    }
}

/// Uma observação a registrar em [`PerformanceMetrics::update`].
#[derive(Debug, Clone, Default)]
pub struct MetricsUpdate<'a> {
    pub success: bool,
    /// Segundos.
    pub execution_time: f64,
    pub context_key: Option<&'a str>,
    pub parser_kind: Option<ParserKind>,
    pub pattern_name: Option<&'a str>,
    pub cache_hit: Option<bool>,
}

/// Agregado de uso, sucesso e tempo de um padrão.
///
/// Só muda via [`PerformanceMetrics::update`]; `successful_matches <= total_uses` sempre.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub total_uses: u64,
    pub successful_matches: u64,
    pub failed_matches: u64,
    /// Média de todas as execuções, não só das amostras guardadas.
    pub avg_time: f64,
    pub execution_times: VecDeque<f64>,
    pub context_performance: HashMap<String, ContextPerformance>,
    pub parser_stats: HashMap<ParserKind, ParserStats>,
    pub pattern_match_counts: HashMap<String, u64>,
    pub pattern_timings: HashMap<String, VecDeque<f64>>,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub last_updated: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Visão serializável e compacta das métricas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_uses: u64,
    pub successful_matches: u64,
    pub failed_matches: u64,
    pub success_rate: f64,
    pub avg_execution_time: f64,
    pub cache_hit_rate: f64,
    pub contexts: usize,
    pub parser_success_rates: BTreeMap<String, f64>,
    pub last_updated: DateTime<Utc>,
}

impl Default for PerformanceMetrics {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            total_uses: 0,
            successful_matches: 0,
            failed_matches: 0,
            avg_time: 0.0,
            execution_times: VecDeque::new(),
            context_performance: HashMap::new(),
            parser_stats: HashMap::new(),
            pattern_match_counts: HashMap::new(),
            pattern_timings: HashMap::new(),
            cache_hits: 0,
            cache_misses: 0,
            last_updated: now,
            created_at: now,
        }
    }
}

impl PerformanceMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra uma observação.
    pub fn update(&mut self, update: MetricsUpdate<'_>) {
        let time = update.execution_time;

        self.total_uses += 1;
        if update.success {
            self.successful_matches += 1;
        } else {
            self.failed_matches += 1;
        }
        self.avg_time = running_average(self.avg_time, time, self.total_uses);
        push_sample(&mut self.execution_times, time);

        if let Some(key) = update.context_key {
            let ctx = self.context_performance.entry(key.to_string()).or_default();
            ctx.uses += 1;
            if update.success {
                ctx.successes += 1;
            }
            ctx.avg_time = running_average(ctx.avg_time, time, ctx.uses);
        }

        if let Some(kind) = update.parser_kind {
            let stats = self.parser_stats.entry(kind).or_default();
            stats.total += 1;
            if update.success {
                stats.successful += 1;
            } else {
                stats.failed += 1;
            }
            stats.avg_time = running_average(stats.avg_time, time, stats.total);
        }

        if let Some(name) = update.pattern_name {
            *self.pattern_match_counts.entry(name.to_string()).or_insert(0) += 1;
            push_sample(self.pattern_timings.entry(name.to_string()).or_default(), time);
        }

        match update.cache_hit {
            Some(true) => self.cache_hits += 1,
            Some(false) => self.cache_misses += 1,
            None => {}
        }

        self.last_updated = Utc::now();
    }

    /// Taxa de sucesso global (0 sem usos).
    pub fn success_rate(&self) -> f64 {
        ratio(self.successful_matches, self.total_uses)
    }

    /// Taxa de sucesso para um tipo de parser (0 sem usos).
    pub fn parser_success_rate(&self, kind: ParserKind) -> f64 {
        self.parser_stats
            .get(&kind)
            .map(ParserStats::success_rate)
            .unwrap_or(0.0)
    }

    /// Tempo médio de execução em segundos.
    pub fn avg_execution_time(&self) -> f64 {
        self.avg_time
    }

    /// Tempo médio para um tipo de parser.
    pub fn parser_avg_time(&self, kind: ParserKind) -> f64 {
        self.parser_stats
            .get(&kind)
            .map(|s| s.avg_time)
            .unwrap_or(0.0)
    }

    /// Balde de um contexto, se já usado.
    pub fn context(&self, context_key: &str) -> Option<&ContextPerformance> {
        self.context_performance.get(context_key)
    }

    /// Estatísticas de um tipo de parser, se já usado.
    pub fn parser(&self, kind: ParserKind) -> Option<&ParserStats> {
        self.parser_stats.get(&kind)
    }

    pub fn cache_hit_rate(&self) -> f64 {
        ratio(self.cache_hits, self.cache_hits + self.cache_misses)
    }

    /// Resumo serializável.
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_uses: self.total_uses,
            successful_matches: self.successful_matches,
            failed_matches: self.failed_matches,
            success_rate: self.success_rate(),
            avg_execution_time: self.avg_execution_time(),
            cache_hit_rate: self.cache_hit_rate(),
            contexts: self.context_performance.len(),
            parser_success_rates: self
                .parser_stats
                .iter()
                .map(|(kind, stats)| (kind.to_string(), stats.success_rate()))
                .collect(),
            last_updated: self.last_updated,
        }
    }
}

fn ratio(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

fn push_sample(samples: &mut VecDeque<f64>, time: f64) {
    if samples.len() == MAX_TIMING_SAMPLES {
        samples.pop_front();
    }
    samples.push_back(time);
}

fn running_average(current: f64, sample: f64, count: u64) -> f64 {
    current + (sample - current) / count as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observe(metrics: &mut PerformanceMetrics, success: bool, key: &str, kind: ParserKind) {
        metrics.update(MetricsUpdate {
            success,
            execution_time: 0.01,
            context_key: Some(key),
            parser_kind: Some(kind),
            pattern_name: Some("getter"),
            cache_hit: Some(false),
        });
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = PerformanceMetrics::new();
        assert_eq!(metrics.success_rate(), 0.0);
        assert_eq!(metrics.avg_execution_time(), 0.0);
        assert_eq!(metrics.parser_success_rate(ParserKind::Custom), 0.0);
        assert!(metrics.context("any").is_none());
    }

    #[test]
    fn test_update_counts() {
        let mut metrics = PerformanceMetrics::new();
        observe(&mut metrics, true, "k1", ParserKind::Custom);
        observe(&mut metrics, false, "k1", ParserKind::Custom);
        observe(&mut metrics, true, "k2", ParserKind::TreeSitter);

        assert_eq!(metrics.total_uses, 3);
        assert_eq!(metrics.successful_matches, 2);
        assert_eq!(metrics.failed_matches, 1);
        assert!((metrics.success_rate() - 2.0 / 3.0).abs() < 1e-9);

        let k1 = metrics.context("k1").unwrap();
        assert_eq!((k1.uses, k1.successes), (2, 1));

        let custom = metrics.parser(ParserKind::Custom).unwrap();
        assert_eq!((custom.total, custom.successful, custom.failed), (2, 1, 1));
        assert_eq!(metrics.pattern_match_counts["getter"], 3);
        assert_eq!(metrics.cache_misses, 3);
    }

    #[test]
    fn test_running_average() {
        let mut metrics = PerformanceMetrics::new();
        for time in [1.0, 2.0, 3.0] {
            metrics.update(MetricsUpdate {
                success: true,
                execution_time: time,
                context_key: Some("k"),
                ..Default::default()
            });
        }

        assert!((metrics.context("k").unwrap().avg_time - 2.0).abs() < 1e-9);
        assert!((metrics.avg_execution_time() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_timings_are_bounded() {
        let mut metrics = PerformanceMetrics::new();
        for i in 0..MAX_TIMING_SAMPLES + 10 {
            metrics.update(MetricsUpdate {
                success: true,
                execution_time: i as f64,
                pattern_name: Some("getter"),
                ..Default::default()
            });
        }

        assert_eq!(metrics.execution_times.len(), MAX_TIMING_SAMPLES);
        assert_eq!(metrics.pattern_timings["getter"].len(), MAX_TIMING_SAMPLES);
        assert_eq!(metrics.execution_times.front(), Some(&10.0));
        // a média continua cobrindo todas as execuções
        let expected = (MAX_TIMING_SAMPLES + 9) as f64 / 2.0;
        assert!((metrics.avg_execution_time() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_successes_never_exceed_total() {
        let mut metrics = PerformanceMetrics::new();
        for i in 0..50 {
            observe(&mut metrics, i % 3 != 0, "k", ParserKind::Unknown);
            assert!(metrics.successful_matches <= metrics.total_uses);
            let rate = metrics.success_rate();
            assert!((0.0..=1.0).contains(&rate));
        }
    }

    #[test]
    fn test_summary_serializes() {
        let mut metrics = PerformanceMetrics::new();
        observe(&mut metrics, true, "k", ParserKind::TreeSitter);

        let summary = metrics.summary();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["total_uses"], 1);
        assert_eq!(json["parser_success_rates"]["tree_sitter"], 1.0);
    }
}
