//! Model backend traits.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{CanonicalResponse, Message, ToolCapabilityDescriptor};

/// A language model provider.
///
/// Implementations translate canonical history into their own request shape
/// and their own response back into a [`CanonicalResponse`]. Provider-specific
/// fields never leave the implementation.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short provider label used in logs and metrics.
    fn name(&self) -> &str;

    /// Produce the next turn for the given history.
    async fn complete(
        &self,
        history: &[Message],
        system: Option<&str>,
        tools: &[ToolCapabilityDescriptor],
    ) -> Result<CanonicalResponse>;
}
