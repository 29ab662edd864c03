//! Attribute-based policy engine
//!
//! Orchestrates attribute enrichment, policy filtering and evaluation,
//! decision combination and decision caching.

pub mod cache;
pub mod combiner;
pub mod decision;
pub mod metrics;

pub use cache::{CacheKey, CacheStats, CachedDecision, DecisionCache};
pub use combiner::{AllMustAllow, AnyCanAllow, PolicyCombiner, PriorityBased};
pub use decision::{Decision, Effect};
pub use metrics::{EngineMetrics, MetricsCollector};

use crate::error::{AuthzError, Result};
use crate::policy::{builtin_policies, Policy};
use crate::provider::AttributeProvider;
use crate::types::{AccessRequest, Attributes};

use std::fmt::Display;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Policy engine configuration
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Enable decision caching
    pub enable_cache: bool,

    /// Lifetime of a cached decision
    pub cache_ttl: Duration,

    /// Cache size above which expired entries are swept on write
    pub cache_sweep_threshold: usize,

    /// Enable metrics collection
    pub enable_metrics: bool,

    /// Decision when no registered policy applies. RBAC has already gated
    /// the action at that point, so the default is to allow.
    pub default_effect: Effect,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_cache: true,
            cache_ttl: Duration::from_secs(5 * 60),
            cache_sweep_threshold: 1000,
            enable_metrics: true,
            default_effect: Effect::Allow,
        }
    }
}

impl EngineConfig {
    /// Defaults overridden by `AUTHZ_ENABLE_CACHE`, `AUTHZ_CACHE_TTL_SECS`,
    /// `AUTHZ_CACHE_SWEEP_THRESHOLD` and `AUTHZ_ENABLE_METRICS`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`EngineConfig::from_env`] with a custom variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(enabled) = parse_var(&lookup, "AUTHZ_ENABLE_CACHE")? {
            config.enable_cache = enabled;
        }
        if let Some(secs) = parse_var(&lookup, "AUTHZ_CACHE_TTL_SECS")? {
            config.cache_ttl = Duration::from_secs(secs);
        }
        if let Some(threshold) = parse_var(&lookup, "AUTHZ_CACHE_SWEEP_THRESHOLD")? {
            config.cache_sweep_threshold = threshold;
        }
        if let Some(enabled) = parse_var(&lookup, "AUTHZ_ENABLE_METRICS")? {
            config.enable_metrics = enabled;
        }

        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };

    raw.trim()
        .parse()
        .map(Some)
        .map_err(|e| AuthzError::InvalidInput(format!("{}={:?}: {}", name, raw, e)))
}

/// Everything guarded by the engine lock
struct EngineState {
    policies: Vec<Arc<dyn Policy>>,
    providers: Vec<Arc<dyn AttributeProvider>>,
    combiner: Arc<dyn PolicyCombiner>,
    cache: DecisionCache,
}

/// ABAC policy engine
///
/// # Pipeline
///
/// ```text
/// request → [cache] → providers (enrich) → policies (applies → evaluate)
///                                               ↓
///                     [cache] ← combiner ← decisions
/// ```
///
/// Policies and providers run inline on the caller's task in registration
/// order. Their handles are snapshotted under the read lock, which is
/// released before anything is awaited.
pub struct PolicyEngine {
    state: RwLock<EngineState>,

    metrics: Option<Arc<MetricsCollector>>,

    config: EngineConfig,
}

impl PolicyEngine {
    /// Engine without policies or providers, combining with [`AllMustAllow`]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_policies(config, Vec::new())
    }

    /// Engine pre-loaded with the built-in policies
    pub fn with_builtin_policies(config: EngineConfig) -> Self {
        Self::with_policies(config, builtin_policies())
    }

    fn with_policies(config: EngineConfig, policies: Vec<Arc<dyn Policy>>) -> Self {
        let metrics = config.enable_metrics.then(|| Arc::new(MetricsCollector::new()));

        info!(
            policies = policies.len(),
            cache = config.enable_cache,
            cache_ttl_secs = config.cache_ttl.as_secs(),
            metrics = config.enable_metrics,
            "PolicyEngine initialized"
        );

        Self {
            state: RwLock::new(EngineState {
                policies,
                providers: Vec::new(),
                combiner: Arc::new(AllMustAllow),
                cache: DecisionCache::new(config.cache_ttl, config.cache_sweep_threshold),
            }),
            metrics,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Register a policy; names must be unique
    pub async fn register_policy(&self, policy: Arc<dyn Policy>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.policies.iter().any(|p| p.name() == policy.name()) {
            return Err(AuthzError::DuplicatePolicy(policy.name().to_string()));
        }

        info!(policy = policy.name(), priority = policy.priority(), "Policy registered");
        state.policies.push(policy);
        Ok(())
    }

    pub async fn unregister_policy(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let index = state
            .policies
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| AuthzError::PolicyNotFound(name.to_string()))?;

        state.policies.remove(index);
        info!(policy = name, "Policy unregistered");
        Ok(())
    }

    /// Register an attribute provider; names must be unique
    pub async fn register_attribute_provider(&self, provider: Arc<dyn AttributeProvider>) -> Result<()> {
        let mut state = self.state.write().await;
        if state.providers.iter().any(|p| p.name() == provider.name()) {
            return Err(AuthzError::DuplicateProvider(provider.name().to_string()));
        }

        info!(provider = provider.name(), "Attribute provider registered");
        state.providers.push(provider);
        Ok(())
    }

    pub async fn unregister_attribute_provider(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        let index = state
            .providers
            .iter()
            .position(|p| p.name() == name)
            .ok_or_else(|| AuthzError::ProviderNotFound(name.to_string()))?;

        state.providers.remove(index);
        info!(provider = name, "Attribute provider unregistered");
        Ok(())
    }

    /// Swap the combination strategy
    pub async fn set_policy_combiner(&self, combiner: Arc<dyn PolicyCombiner>) {
        let mut state = self.state.write().await;
        info!(from = state.combiner.name(), to = combiner.name(), "Policy combiner changed");
        state.combiner = combiner;
    }

    /// Registered policy names, in registration order
    pub async fn policy_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.policies.iter().map(|p| p.name().to_string()).collect()
    }

    /// Registered provider names, in registration order
    pub async fn provider_names(&self) -> Vec<String> {
        let state = self.state.read().await;
        state.providers.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn combiner_name(&self) -> String {
        self.state.read().await.combiner.name().to_string()
    }

    /// Evaluate a request, returning only the verdict
    pub async fn evaluate(&self, request: &mut AccessRequest) -> Result<bool> {
        Ok(self.evaluate_decision(request).await?.allow)
    }

    /// Evaluate a request through the full pipeline
    ///
    /// 1. Serve an unexpired cached decision for the same
    ///    `(user, action, resource type, resource id)`
    /// 2. Merge provider attributes into the request (existing keys win)
    /// 3. Evaluate every applicable policy; failing policies lose their vote
    /// 4. Combine the decisions, or fall back to the default effect when no
    ///    policy applied
    /// 5. Cache the result, sweeping expired entries past the threshold
    pub async fn evaluate_decision(&self, request: &mut AccessRequest) -> Result<Decision> {
        validate(request)?;

        let start = Instant::now();
        let key = CacheKey::from_request(request);

        let (providers, policies, combiner) = {
            let state = self.state.read().await;

            if self.config.enable_cache {
                if let Some(decision) = state.cache.get(&key, Instant::now()).cloned() {
                    drop(state);
                    debug!(
                        user_id = %key.user_id,
                        action = %key.action,
                        resource_type = %key.resource_type,
                        resource_id = %key.resource_id,
                        allowed = decision.allow,
                        "Cache hit"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_cache_hit().await;
                        metrics.record_decision(decision.allow).await;
                        metrics.record_latency(start.elapsed()).await;
                    }
                    return Ok(decision);
                }
            }

            (state.providers.clone(), state.policies.clone(), Arc::clone(&state.combiner))
        };

        if self.config.enable_cache {
            debug!(user_id = %key.user_id, action = %key.action, "Cache miss");
            if let Some(metrics) = &self.metrics {
                metrics.record_cache_miss().await;
            }
        }

        self.enrich(request, &providers).await;
        let decisions = self.collect_decisions(request, &policies).await;

        let decision = if decisions.is_empty() {
            Decision::from_effect(self.config.default_effect, "No applicable policies")
        } else {
            combiner
                .combine(decisions)
                .with_metadata("combiner", combiner.name())
        };

        if self.config.enable_cache {
            let swept = {
                let mut state = self.state.write().await;
                state.cache.insert(key, decision.clone(), Instant::now())
            };
            if swept > 0 {
                debug!(swept, "Swept expired cache entries");
                if let Some(metrics) = &self.metrics {
                    metrics.record_sweep(swept).await;
                }
            }
        }

        if decision.allow {
            debug!(
                user_id = %request.subject.user_id,
                action = %request.action,
                resource_type = %request.resource.resource_type,
                resource_id = %request.resource.id,
                reason = %decision.reason,
                "ABAC decision: ALLOW"
            );
        } else {
            info!(
                user_id = %request.subject.user_id,
                action = %request.action,
                resource_type = %request.resource.resource_type,
                resource_id = %request.resource.id,
                reason = %decision.reason,
                "ABAC decision: DENY"
            );
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(decision.allow).await;
            metrics.record_latency(start.elapsed()).await;
        }

        Ok(decision)
    }

    /// Drop every cached decision
    pub async fn invalidate_cache(&self) {
        self.state.write().await.cache.clear();
        info!("Decision cache invalidated");
    }

    /// Drop cached decisions for one subject, e.g. after its attributes changed
    pub async fn invalidate_user(&self, user_id: &str) -> usize {
        let removed = self.state.write().await.cache.invalidate_user(user_id);
        debug!(user_id, removed, "Cached decisions invalidated for user");
        removed
    }

    pub async fn cache_stats(&self) -> CacheStats {
        self.state.read().await.cache.stats(Instant::now())
    }

    pub async fn get_metrics(&self) -> Option<EngineMetrics> {
        match &self.metrics {
            Some(metrics) => Some(metrics.get_metrics().await),
            None => None,
        }
    }

    pub async fn export_metrics(&self) -> Option<String> {
        match &self.metrics {
            Some(metrics) => Some(metrics.export_prometheus().await),
            None => None,
        }
    }

    async fn enrich(&self, request: &mut AccessRequest, providers: &[Arc<dyn AttributeProvider>]) {
        for provider in providers {
            match provider.load_user_attributes(&request.subject.user_id).await {
                Ok(attributes) => merge_missing(&mut request.subject.attributes, attributes),
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        user_id = %request.subject.user_id,
                        error = %e,
                        "Failed to load user attributes, skipping provider"
                    );
                    self.record_provider_error().await;
                    continue;
                }
            }

            let loaded = provider
                .load_resource_attributes(&request.resource.resource_type, &request.resource.id)
                .await;
            match loaded {
                Ok(attributes) => merge_missing(&mut request.resource.attributes, attributes),
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        resource_type = %request.resource.resource_type,
                        resource_id = %request.resource.id,
                        error = %e,
                        "Failed to load resource attributes"
                    );
                    self.record_provider_error().await;
                }
            }
        }
    }

    async fn collect_decisions(&self, request: &AccessRequest, policies: &[Arc<dyn Policy>]) -> Vec<Decision> {
        let mut decisions = Vec::new();

        for policy in policies {
            if !policy.applies(request) {
                debug!(policy = policy.name(), "Policy not applicable");
                continue;
            }

            match policy.evaluate(request).await {
                Ok(decision) => {
                    debug!(
                        policy = policy.name(),
                        allowed = decision.allow,
                        reason = %decision.reason,
                        "Policy evaluated"
                    );
                    decisions.push(
                        decision
                            .with_priority(policy.priority())
                            .with_metadata("policy", policy.name()),
                    );
                }
                Err(e) => {
                    warn!(policy = policy.name(), error = %e, "Policy evaluation failed, discarding vote");
                    if let Some(metrics) = &self.metrics {
                        metrics.record_policy_error().await;
                    }
                }
            }
        }

        decisions
    }

    async fn record_provider_error(&self) {
        if let Some(metrics) = &self.metrics {
            metrics.record_provider_error().await;
        }
    }
}

fn validate(request: &AccessRequest) -> Result<()> {
    if request.subject.user_id.is_empty() {
        return Err(AuthzError::InvalidInput("request subject has no user id".to_string()));
    }
    if request.resource.resource_type.is_empty() {
        return Err(AuthzError::InvalidInput("request resource has no type".to_string()));
    }
    Ok(())
}

/// First writer wins: keys already on the request are never overwritten
fn merge_missing(target: &mut Attributes, source: Attributes) {
    for (key, value) in source {
        target.entry(key).or_insert(value);
    }
}
