//! The registration contract between a plugin and the router.

use serde::Serialize;

use crate::routing::error::RouterError;
use crate::routing::route::MountContext;
use crate::routing::router::Router;

/// A named group of routes mounted under one prefix.
pub trait Gateway: Send + Sync {
    /// Short name, shown by introspection.
    fn label(&self) -> &str;

    /// Human readable description.
    fn description(&self) -> &str;

    /// Add this gateway's routes. Patterns are relative to `ctx.prefix()`.
    fn register_handlers(&self, ctx: &MountContext, router: &Router) -> Result<(), RouterError>;
}

/// Metadata recorded for each mounted prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayInfo {
    pub prefix: String,
    pub label: String,
    pub description: String,
}
