//! Pluggable HTTP gateway library.
//!
//! Plugins mount under a prefix and register routes with a shared
//! [`routing::Router`], which resolves every request to a handler, a 404 or a 405.

pub mod config;
pub mod gateways;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod plugins;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::Router;
