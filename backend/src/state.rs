//! Application state management
//!
//! This module provides the shared application state that is passed
//! to all request handlers via Axum's state extraction.
//!
//! # Design Principles
//!
//! 1. **Pre-compute expensive resources**: JWT keys are derived once
//! 2. **Cheap cloning**: All fields use Arc or are already Clone-cheap
//! 3. **Injected storage**: the user store is chosen by the caller

use crate::config::AppConfig;
use crate::repositories::UserStore;
use crate::services::CredentialService;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Credential service with cached keys and the user store
    pub credentials: CredentialService,
    /// Prometheus scrape handle, when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create a new application state over the given user store
    pub fn new(store: Arc<dyn UserStore>, config: AppConfig) -> Self {
        let credentials = CredentialService::from_config(store, &config);

        Self {
            config: Arc::new(config),
            credentials,
            metrics: None,
        }
    }

    /// Attach the Prometheus handle served at `/metrics`
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the credential service
    #[inline]
    pub fn credentials(&self) -> &CredentialService {
        &self.credentials
    }
}
