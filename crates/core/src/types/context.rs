use std::sync::Arc;

use crate::error::{Error, Result};
use crate::traits::{DataStore, LookupService, ModerationApi};

/// External services available to tool handlers.
///
/// Every accessor fails with [`Error::ServiceUnavailable`] when the service
/// was not configured, so a handler never silently runs against nothing.
#[derive(Clone, Default)]
pub struct ToolContext {
    data_store: Option<Arc<dyn DataStore>>,
    lookup: Option<Arc<dyn LookupService>>,
    moderation: Option<Arc<dyn ModerationApi>>,
}

impl ToolContext {
    /// Create a context with no services configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a data store.
    pub fn with_data_store(mut self, store: Arc<dyn DataStore>) -> Self {
        self.data_store = Some(store);
        self
    }

    /// Attach a lookup service.
    pub fn with_lookup(mut self, lookup: Arc<dyn LookupService>) -> Self {
        self.lookup = Some(lookup);
        self
    }

    /// Attach a moderation API client.
    pub fn with_moderation(mut self, moderation: Arc<dyn ModerationApi>) -> Self {
        self.moderation = Some(moderation);
        self
    }

    pub fn data_store(&self) -> Result<&Arc<dyn DataStore>> {
        self.data_store
            .as_ref()
            .ok_or_else(|| Error::service_unavailable("Data store"))
    }

    pub fn lookup(&self) -> Result<&Arc<dyn LookupService>> {
        self.lookup
            .as_ref()
            .ok_or_else(|| Error::service_unavailable("Lookup service"))
    }

    pub fn moderation(&self) -> Result<&Arc<dyn ModerationApi>> {
        self.moderation
            .as_ref()
            .ok_or_else(|| Error::service_unavailable("Moderation API"))
    }
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("data_store", &self.data_store.is_some())
            .field("lookup", &self.lookup.is_some())
            .field("moderation", &self.moderation.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockDataStore;

    #[test]
    fn test_unconfigured_services_fail_loudly() {
        let ctx = ToolContext::new();
        assert!(matches!(ctx.data_store(), Err(Error::ServiceUnavailable(_))));
        assert!(matches!(ctx.lookup(), Err(Error::ServiceUnavailable(_))));
        let err = ctx.moderation().err().unwrap();
        assert_eq!(err.to_string(), "Moderation API not configured");
    }

    #[test]
    fn test_configured_data_store() {
        let ctx = ToolContext::new().with_data_store(Arc::new(MockDataStore::default()));
        assert!(ctx.data_store().is_ok());
        assert!(format!("{:?}", ctx).contains("data_store: true"));
    }
}
