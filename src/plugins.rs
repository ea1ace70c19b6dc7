//! Plugin provider.
//!
//! Builds the configured gateways by plugin name and mounts them on a router.

use std::sync::Arc;

use thiserror::Error;

use crate::config::{GatewayConfig, MountConfig};
use crate::gateways::{FileGateway, StatusGateway};
use crate::routing::{Gateway, Router, RouterError};

pub const PLUGIN_STATUS: &str = "status";
pub const PLUGIN_FILES: &str = "files";

#[derive(Debug, Error)]
pub enum PluginError {
    #[error("unknown plugin {0:?}")]
    UnknownPlugin(String),

    #[error("plugin {0:?} requires a root directory")]
    MissingRoot(String),
}

struct Mounted {
    prefix: String,
    label: String,
    gateway: Arc<dyn Gateway>,
}

/// Owns the configuration and the plugins built from it.
pub struct Provider {
    config: GatewayConfig,
    plugins: Vec<Mounted>,
}

impl Provider {
    /// Build every gateway listed in the configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, PluginError> {
        let plugins = config
            .gateways
            .iter()
            .map(|mount| {
                Ok(Mounted {
                    prefix: mount.prefix.clone(),
                    label: mount.label().to_string(),
                    gateway: build_gateway(mount)?,
                })
            })
            .collect::<Result<Vec<_>, PluginError>>()?;

        Ok(Self { config, plugins })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Labels of the built plugins, in configuration order.
    pub fn plugins(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.label.as_str()).collect()
    }

    /// Look up a plugin by label.
    pub fn plugin(&self, label: &str) -> Option<Arc<dyn Gateway>> {
        self.plugins
            .iter()
            .find(|p| p.label == label)
            .map(|p| p.gateway.clone())
    }

    /// An empty router configured from `[router]`.
    pub fn router(&self) -> Router {
        let cfg = &self.config.router;
        let router = Router::new(cfg.label.clone());
        if cfg.cache_enabled {
            router.with_cache(cfg.cache_capacity)
        } else {
            router
        }
    }

    /// Mount the router's own endpoints, then every plugin. Stops at the first error.
    pub fn mount_all(&self, router: &Arc<Router>) -> Result<(), RouterError> {
        if let Some(prefix) = self.config.router.self_prefix() {
            router.mount_self(prefix)?;
        }
        for plugin in &self.plugins {
            router.mount_gateway(&plugin.prefix, plugin.gateway.as_ref())?;
        }
        tracing::info!(
            prefixes = ?router.prefixes(),
            routes = router.len(),
            "Gateways mounted"
        );
        Ok(())
    }
}

fn build_gateway(mount: &MountConfig) -> Result<Arc<dyn Gateway>, PluginError> {
    match mount.plugin.as_str() {
        PLUGIN_STATUS => Ok(Arc::new(StatusGateway::new(
            mount.label(),
            mount.description.clone(),
        ))),
        PLUGIN_FILES => {
            let root = mount
                .root
                .clone()
                .ok_or_else(|| PluginError::MissingRoot(mount.label().to_string()))?;
            Ok(Arc::new(FileGateway::new(
                mount.label(),
                mount.description.clone(),
                root,
            )))
        }
        other => Err(PluginError::UnknownPlugin(other.to_string())),
    }
}
