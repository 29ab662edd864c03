//! Attribute providers
//!
//! Providers enrich a request's subject and resource attributes right before
//! policies run. They are external data sources (enrollment records, course
//! progress, resource metadata); the engine only relies on this contract.

use crate::error::Result;
use crate::types::Attributes;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Source of additional subject/resource attributes
#[async_trait]
pub trait AttributeProvider: Send + Sync {
    /// Unique name within an engine
    fn name(&self) -> &str;

    async fn load_user_attributes(&self, user_id: &str) -> Result<Attributes>;

    async fn load_resource_attributes(&self, resource_type: &str, resource_id: &str) -> Result<Attributes>;
}

/// In-memory attribute provider
pub struct StaticAttributeProvider {
    name: String,
    users: Arc<RwLock<HashMap<String, Attributes>>>,
    resources: Arc<RwLock<HashMap<(String, String), Attributes>>>,
}

impl StaticAttributeProvider {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: Arc::new(RwLock::new(HashMap::new())),
            resources: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn set_user_attribute(&self, user_id: &str, key: impl Into<String>, value: impl Into<Value>) {
        self.users
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .insert(key.into(), value.into());
    }

    pub async fn set_resource_attribute(
        &self,
        resource_type: &str,
        resource_id: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.resources
            .write()
            .await
            .entry((resource_type.to_string(), resource_id.to_string()))
            .or_default()
            .insert(key.into(), value.into());
    }
}

#[async_trait]
impl AttributeProvider for StaticAttributeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn load_user_attributes(&self, user_id: &str) -> Result<Attributes> {
        Ok(self.users.read().await.get(user_id).cloned().unwrap_or_default())
    }

    async fn load_resource_attributes(&self, resource_type: &str, resource_id: &str) -> Result<Attributes> {
        let key = (resource_type.to_string(), resource_id.to_string());
        Ok(self.resources.read().await.get(&key).cloned().unwrap_or_default())
    }
}
