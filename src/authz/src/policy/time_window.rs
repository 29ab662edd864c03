use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

use super::Policy;
use crate::engine::Decision;
use crate::error::Result;
use crate::types::{attr, AccessRequest};

/// Restricts access to a resource's `[access_start_time, access_end_time]`
/// window. Bounds are RFC 3339 strings or unix timestamps in seconds; a
/// bound that cannot be read is ignored.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimeBasedAccessPolicy;

impl TimeBasedAccessPolicy {
    fn bound(request: &AccessRequest, key: &str) -> Option<DateTime<Utc>> {
        let value = request.resource.attributes.get(key)?;
        let parsed = parse_time(value);
        if parsed.is_none() {
            debug!(attribute = key, value = %value, "Ignoring unreadable access window bound");
        }
        parsed
    }
}

#[async_trait]
impl Policy for TimeBasedAccessPolicy {
    fn name(&self) -> &str {
        "time_based_access"
    }

    fn priority(&self) -> i32 {
        150
    }

    fn applies(&self, request: &AccessRequest) -> bool {
        let attributes = &request.resource.attributes;
        attributes.contains_key(attr::ACCESS_START_TIME) || attributes.contains_key(attr::ACCESS_END_TIME)
    }

    async fn evaluate(&self, request: &AccessRequest) -> Result<Decision> {
        let now = Utc::now();

        if let Some(start) = Self::bound(request, attr::ACCESS_START_TIME) {
            if now < start {
                return Ok(Decision::deny("Content not yet available")
                    .with_metadata(attr::ACCESS_START_TIME, start.to_rfc3339()));
            }
        }

        if let Some(end) = Self::bound(request, attr::ACCESS_END_TIME) {
            if now > end {
                return Ok(Decision::deny("Content access has expired")
                    .with_metadata(attr::ACCESS_END_TIME, end.to_rfc3339()));
            }
        }

        Ok(Decision::allow("Within access time window"))
    }
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(|secs| Utc.timestamp_opt(secs, 0).single()),
        _ => None,
    }
}
