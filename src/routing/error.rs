//! Registration errors.
//!
//! Only configuration and programming mistakes surface here. "Not found" and
//! "method not allowed" are resolution outcomes, see [`Resolution`](super::Resolution).

use thiserror::Error;

/// Error returned synchronously by the registration API.
#[derive(Debug, Error)]
pub enum RouterError {
    /// A gateway is already mounted at this prefix.
    #[error("duplicate prefix {0:?}")]
    DuplicatePrefix(String),

    /// No handler was supplied for a route.
    #[error("invalid handler")]
    InvalidHandler,

    /// The host/prefix target could not be parsed.
    #[error("invalid prefix {0:?}")]
    InvalidPrefix(String),

    /// The path pattern is not a valid regular expression.
    #[error("invalid path pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
