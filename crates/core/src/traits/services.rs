//! External service traits consumed by tool handlers.
//!
//! Concrete clients live outside this workspace; handlers reach them through
//! [`crate::types::ToolContext`].

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Analytical data store accepting read-only SQL.
#[async_trait]
pub trait DataStore: Send + Sync {
    /// Run a query and return the rows as JSON objects.
    async fn query(&self, sql: &str) -> Result<Vec<Value>>;
}

/// Network intelligence lookups (DNS, WHOIS, IP geolocation).
#[async_trait]
pub trait LookupService: Send + Sync {
    /// Look up `target` with the named lookup kind, e.g. `dns` or `whois`.
    async fn lookup(&self, kind: &str, target: &str) -> Result<Value>;
}

/// Moderation service applying actions to subjects.
#[async_trait]
pub trait ModerationApi: Send + Sync {
    /// Apply `action` to `subject` and return the service's receipt.
    async fn apply(&self, subject: &str, action: &str, reason: Option<&str>) -> Result<Value>;
}
