//! Built-in gateways.
//!
//! Each one mounts under a prefix and registers its routes through
//! [`Router::add_handler`](crate::routing::Router::add_handler).

pub mod files;
pub mod router;
pub mod status;

pub use files::FileGateway;
pub use router::RouterGateway;
pub use status::StatusGateway;
