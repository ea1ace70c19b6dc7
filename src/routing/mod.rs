//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Router::mount_gateway(prefix, gateway)
//!     → gateway.register_handlers(MountContext { prefix }, router)
//!     → router.add_handler(ctx, RouteDescriptor, handler)
//!     → route.rs (normalize host/prefix, default methods)
//!     → router.rs (assign priority, re-sort table)
//!
//! Incoming Request (host, method, path)
//!     → router.rs (scan in match order, cache.rs memo)
//!     → matcher.rs (host suffix, path prefix + pattern, method)
//!     → Matched route + RouteMatch | NotFound | MethodNotAllowed
//! ```
//!
//! # Design Decisions
//! - Longest prefix wins; later pattern routes beat earlier ones; default routes come last
//! - Regex patterns only run on the remainder after a literal prefix compare
//! - Deterministic: same table and input always resolve the same way
//! - First match wins

pub mod cache;
pub mod error;
pub mod gateway;
pub mod matcher;
pub mod route;
pub mod router;

pub use error::RouterError;
pub use gateway::{Gateway, GatewayInfo};
pub use route::{handler, Handler, MountContext, Route, RouteDescriptor, RouteHandler, RouteMatch};
pub use router::{Resolution, Router};
