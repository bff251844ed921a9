//! Shared application state for all routes. Built once at startup; read-only afterwards.

use crate::config::ResolvedModel;
use crate::provider::ProviderRegistry;
use crate::store::RecordStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ResolvedModel>,
    pub registry: Arc<ProviderRegistry>,
    /// Used directly only by the readiness check; reads go through the registry.
    pub store: Arc<dyn RecordStore>,
    /// Path segment the OData service is mounted under, without slashes.
    pub service_path: String,
}

impl AppState {
    pub fn new(
        model: ResolvedModel,
        registry: ProviderRegistry,
        store: Arc<dyn RecordStore>,
        service_path: impl Into<String>,
    ) -> Self {
        AppState {
            model: Arc::new(model),
            registry: Arc::new(registry),
            store,
            service_path: service_path.into().trim_matches('/').to_string(),
        }
    }
}
