//! Evaluation counters and latency summary for the policy engine

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

const MAX_LATENCY_SAMPLES: usize = 10_000;
const SAMPLE_DRAIN: usize = 1_000;

/// Snapshot of engine activity
#[derive(Debug, Clone, Default)]
pub struct EngineMetrics {
    /// Requests that reached the ABAC layer
    pub evaluations: u64,

    pub allowed_decisions: u64,
    pub denied_decisions: u64,

    pub cache_hits: u64,
    pub cache_misses: u64,

    /// Policy votes discarded because `evaluate` failed
    pub policy_errors: u64,

    /// Attribute providers skipped because loading failed
    pub provider_errors: u64,

    /// Expired cache entries removed by sweeps
    pub swept_entries: u64,

    pub avg_latency_ms: f64,
    pub latency_p50_ms: f64,
    pub latency_p90_ms: f64,
    pub latency_p99_ms: f64,
}

impl EngineMetrics {
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }

    pub fn allow_rate(&self) -> f64 {
        let total = self.allowed_decisions + self.denied_decisions;
        if total == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / total as f64
        }
    }
}

/// Collects engine metrics behind an async lock
pub struct MetricsCollector {
    metrics: Arc<RwLock<EngineMetrics>>,

    /// Recent latency samples in milliseconds
    latency_samples: Arc<RwLock<Vec<f64>>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(EngineMetrics::default())),
            latency_samples: Arc::new(RwLock::new(Vec::with_capacity(MAX_LATENCY_SAMPLES))),
        }
    }

    pub async fn record_cache_hit(&self) {
        self.metrics.write().await.cache_hits += 1;
    }

    pub async fn record_cache_miss(&self) {
        self.metrics.write().await.cache_misses += 1;
    }

    pub async fn record_policy_error(&self) {
        self.metrics.write().await.policy_errors += 1;
    }

    pub async fn record_provider_error(&self) {
        self.metrics.write().await.provider_errors += 1;
    }

    pub async fn record_sweep(&self, removed: usize) {
        self.metrics.write().await.swept_entries += removed as u64;
    }

    /// Record a final decision, cached or freshly evaluated
    pub async fn record_decision(&self, allowed: bool) {
        let mut metrics = self.metrics.write().await;
        metrics.evaluations += 1;
        if allowed {
            metrics.allowed_decisions += 1;
        } else {
            metrics.denied_decisions += 1;
        }
    }

    pub async fn record_latency(&self, latency: Duration) {
        let mut samples = self.latency_samples.write().await;
        samples.push(latency.as_secs_f64() * 1000.0);
        if samples.len() > MAX_LATENCY_SAMPLES {
            samples.drain(0..SAMPLE_DRAIN);
        }
    }

    /// Counters plus a latency summary computed from the current samples
    pub async fn get_metrics(&self) -> EngineMetrics {
        let mut sorted = self.latency_samples.read().await.clone();
        let mut metrics = self.metrics.read().await.clone();
        if sorted.is_empty() {
            return metrics;
        }

        sorted.sort_by(|a, b| a.total_cmp(b));
        metrics.avg_latency_ms = sorted.iter().sum::<f64>() / sorted.len() as f64;
        metrics.latency_p50_ms = percentile(&sorted, 0.50);
        metrics.latency_p90_ms = percentile(&sorted, 0.90);
        metrics.latency_p99_ms = percentile(&sorted, 0.99);
        metrics
    }

    pub async fn reset(&self) {
        *self.metrics.write().await = EngineMetrics::default();
        self.latency_samples.write().await.clear();
    }

    /// Export metrics in Prometheus text format
    pub async fn export_prometheus(&self) -> String {
        let m = self.get_metrics().await;

        format!(
            r#"# HELP abac_evaluations_total Requests evaluated by the ABAC layer
# TYPE abac_evaluations_total counter
abac_evaluations_total {}

# HELP abac_decisions_total Final decisions by outcome
# TYPE abac_decisions_total counter
abac_decisions_total{{outcome="allow"}} {}
abac_decisions_total{{outcome="deny"}} {}

# HELP abac_cache_requests_total Decision cache lookups
# TYPE abac_cache_requests_total counter
abac_cache_requests_total{{result="hit"}} {}
abac_cache_requests_total{{result="miss"}} {}

# HELP abac_failures_total Discarded policy votes and skipped providers
# TYPE abac_failures_total counter
abac_failures_total{{source="policy"}} {}
abac_failures_total{{source="provider"}} {}

# HELP abac_latency_seconds Evaluation latency
# TYPE abac_latency_seconds summary
abac_latency_seconds{{quantile="0.5"}} {}
abac_latency_seconds{{quantile="0.9"}} {}
abac_latency_seconds{{quantile="0.99"}} {}
"#,
            m.evaluations,
            m.allowed_decisions,
            m.denied_decisions,
            m.cache_hits,
            m.cache_misses,
            m.policy_errors,
            m.provider_errors,
            m.latency_p50_ms / 1000.0,
            m.latency_p90_ms / 1000.0,
            m.latency_p99_ms / 1000.0,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }

    let idx = ((sorted.len() as f64) * p) as usize;
    sorted[idx.min(sorted.len() - 1)]
}
