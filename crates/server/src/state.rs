use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use docapi::Services;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use subtle::{Choice, ConstantTimeEq};

/// Shared application state, handed to every stage and handler.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Collection services (one backend handle, acquired at startup)
    pub services: Services,

    /// Prometheus render handle when metrics are enabled
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Open the configured store and bind every collection.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let services = Services::connect(&config.database)?;
        Ok(Self::with_services(config, services))
    }

    /// Build state around already constructed services.
    pub fn with_services(config: ServerConfig, services: Services) -> Self {
        Self {
            config: Arc::new(config),
            services,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Check a presented key against every configured key in constant time.
    pub fn is_valid_api_key(&self, key: &str) -> bool {
        let presented = key.as_bytes();
        let matched = self
            .config
            .api_keys
            .iter()
            .fold(Choice::from(0), |acc, valid| {
                acc | valid.as_bytes().ct_eq(presented)
            });
        matched.into()
    }

    /// Release the store handle.
    pub fn shutdown(&self) -> ServerResult<()> {
        self.services
            .close()
            .map_err(|e| ServerError::Internal(format!("store shutdown failed: {e}")))
    }
}
