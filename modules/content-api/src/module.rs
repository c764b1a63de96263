use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tracing::{info, warn};

use crate::api::rest::routes;
use crate::config::ContentApiConfig;
use crate::domain::formatter::DateFormat;
use crate::domain::ports::ContentPorts;
use crate::domain::service::Service;
use crate::infra::storage::InMemoryContentStore;

/// Wires configuration, storage and the domain service into a routable module.
pub struct ContentApiModule {
    config: ContentApiConfig,
    service: Arc<Service>,
}

impl ContentApiModule {
    /// Builds the module over the in-memory store, loading `config.fixtures`
    /// when set.
    ///
    /// # Errors
    /// Returns an error if the fixture file cannot be loaded or the
    /// configuration is invalid.
    pub fn init(config: ContentApiConfig) -> anyhow::Result<Self> {
        info!("Initializing content API module");

        let store = match &config.fixtures {
            Some(path) => InMemoryContentStore::from_path(path, &config.public_base_url)?,
            None => {
                warn!("No content fixtures configured, serving an empty store");
                InMemoryContentStore::empty(&config.public_base_url)
            }
        };

        let module = Self::with_ports(config, &ContentPorts::from_store(&Arc::new(store)))?;
        info!("Content API module initialized");
        Ok(module)
    }

    /// Builds the module over caller-provided storage ports.
    ///
    /// # Errors
    /// Returns an error if the route settings are invalid or the configured
    /// UTC offset is out of range.
    pub fn with_ports(config: ContentApiConfig, ports: &ContentPorts) -> anyhow::Result<Self> {
        config
            .validate()
            .context("invalid content API route settings")?;
        let dates = DateFormat::with_offset_minutes(config.utc_offset_minutes)
            .with_context(|| {
                format!(
                    "utc_offset_minutes out of range: {}",
                    config.utc_offset_minutes
                )
            })?;
        let service = Service::new(ports, dates, config.service_config());
        Ok(Self {
            config,
            service: Arc::new(service),
        })
    }

    /// Router carrying every content route and the JSON 404 fallback.
    #[must_use]
    pub fn router(&self) -> Router {
        info!(base_path = %self.config.base_path, "Registering content REST routes");
        routes::register_routes(Router::new(), Arc::clone(&self.service), &self.config)
    }

    #[must_use]
    pub fn service(&self) -> Arc<Service> {
        Arc::clone(&self.service)
    }

    #[must_use]
    pub fn config(&self) -> &ContentApiConfig {
        &self.config
    }
}
