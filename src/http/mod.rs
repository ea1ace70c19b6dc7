//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, host extraction)
//!     → routing engine resolves and runs the handler
//!     → response.rs (404 / 405 rendering)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_host, RequestIdExt, X_REQUEST_ID};
pub use server::HttpServer;
