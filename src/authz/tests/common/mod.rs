//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use campus_authz::{
    AccessRequest, AttributeProvider, Attributes, AuthzError, Decision, Policy, Result,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Policy stub that counts `applies`/`evaluate` calls
pub struct CountingPolicy {
    name: String,
    priority: i32,
    verdict: Option<bool>,
    applicable: bool,
    pub applies_calls: AtomicUsize,
    pub evaluate_calls: AtomicUsize,
}

impl CountingPolicy {
    /// Always applies and votes `allow`
    pub fn voting(name: &str, allow: bool) -> Arc<Self> {
        Self::build(name, 0, Some(allow))
    }

    pub fn with_priority(name: &str, priority: i32, allow: bool) -> Arc<Self> {
        Self::build(name, priority, Some(allow))
    }

    /// Always applies but fails to evaluate
    pub fn failing(name: &str) -> Arc<Self> {
        Self::build(name, 0, None)
    }

    /// Never applies; `evaluate` denies if it is ever reached
    pub fn inapplicable(name: &str) -> Arc<Self> {
        let mut policy = Self::new(name, 0, Some(false));
        policy.applicable = false;
        Arc::new(policy)
    }

    fn build(name: &str, priority: i32, verdict: Option<bool>) -> Arc<Self> {
        Arc::new(Self::new(name, priority, verdict))
    }

    fn new(name: &str, priority: i32, verdict: Option<bool>) -> Self {
        Self {
            name: name.to_string(),
            priority,
            verdict,
            applicable: true,
            applies_calls: AtomicUsize::new(0),
            evaluate_calls: AtomicUsize::new(0),
        }
    }

    pub fn evaluations(&self) -> usize {
        self.evaluate_calls.load(Ordering::SeqCst)
    }

    pub fn applications(&self) -> usize {
        self.applies_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Policy for CountingPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn applies(&self, _request: &AccessRequest) -> bool {
        self.applies_calls.fetch_add(1, Ordering::SeqCst);
        self.applicable
    }

    async fn evaluate(&self, _request: &AccessRequest) -> Result<Decision> {
        self.evaluate_calls.fetch_add(1, Ordering::SeqCst);
        match self.verdict {
            Some(true) => Ok(Decision::allow(format!("{} allows", self.name))),
            Some(false) => Ok(Decision::deny(format!("{} denies", self.name))),
            None => Err(AuthzError::EvaluationError(format!("{} is broken", self.name))),
        }
    }
}

/// Provider stub returning fixed attributes, or failing
pub struct FixedProvider {
    name: String,
    user: Option<Attributes>,
    resource: Option<Attributes>,
    pub calls: AtomicUsize,
}

impl FixedProvider {
    pub fn new(name: &str, user: Option<Attributes>, resource: Option<Attributes>) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            user,
            resource,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AttributeProvider for FixedProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_user_attributes(&self, _user_id: &str) -> Result<Attributes> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.user
            .clone()
            .ok_or_else(|| AuthzError::AttributeError(format!("{} unavailable", self.name)))
    }

    async fn load_resource_attributes(&self, _resource_type: &str, _resource_id: &str) -> Result<Attributes> {
        self.resource
            .clone()
            .ok_or_else(|| AuthzError::AttributeError(format!("{} unavailable", self.name)))
    }
}
