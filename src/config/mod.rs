//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → plugins::Provider builds and mounts gateways from it
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; routes are registered from it before traffic
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::GatewayConfig;
pub use schema::ListenerConfig;
pub use schema::LogFormat;
pub use schema::MountConfig;
pub use schema::ObservabilityConfig;
pub use schema::RouterConfig;
pub use validation::ValidationError;
