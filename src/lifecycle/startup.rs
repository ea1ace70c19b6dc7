//! Startup orchestration.
//!
//! # Responsibilities
//! - Build plugins from configuration
//! - Create the router and mount every gateway
//! - Hand the populated router to the HTTP server
//!
//! # Design Decisions
//! - Fail fast: any registration error is fatal
//! - Routes are registered before the listener accepts traffic

use std::sync::Arc;

use thiserror::Error;

use crate::config::GatewayConfig;
use crate::http::HttpServer;
use crate::plugins::{PluginError, Provider};
use crate::routing::{Router, RouterError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    #[error("route registration failed: {0}")]
    Router(#[from] RouterError),
}

/// A populated router and the server that fronts it.
pub struct App {
    pub router: Arc<Router>,
    pub server: HttpServer,
}

/// Build plugins, mount them, and prepare the HTTP server.
pub fn build(config: GatewayConfig) -> Result<App, StartupError> {
    let provider = Provider::new(config)?;
    let router = Arc::new(provider.router());
    provider.mount_all(&router)?;

    tracing::debug!(router = %router, "Route table ready");

    let server = HttpServer::new(provider.config().clone(), router.clone());
    Ok(App { router, server })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MountConfig;

    #[test]
    fn test_build_default() {
        let app = build(GatewayConfig::default()).unwrap();
        assert_eq!(app.router.prefixes(), vec!["/router"]);
        assert_eq!(app.router.len(), 2);
    }

    #[test]
    fn test_build_without_self_mount() {
        let mut config = GatewayConfig::default();
        config.router.mount_self = false;
        let app = build(config).unwrap();
        assert!(app.router.prefixes().is_empty());
        assert!(app.router.is_empty());
    }

    #[test]
    fn test_build_fails_fast() {
        let mut config = GatewayConfig::default();
        config.gateways.push(MountConfig {
            prefix: "/nginx".into(),
            plugin: "nginx".into(),
            label: None,
            description: None,
            root: None,
        });
        assert!(matches!(build(config), Err(StartupError::Plugin(_))));
    }
}
