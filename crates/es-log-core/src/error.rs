//! Error types for the ES log shipper
//!
//! Uses `thiserror` for ergonomic error handling with full context preservation.

use thiserror::Error;

/// Result type alias for shipper operations
pub type Result<T> = std::result::Result<T, ShipperError>;

/// Primary error type for all shipper operations
#[derive(Error, Debug)]
pub enum ShipperError {
    /// Backend unreachable at construction time; the pipeline degrades to
    /// a disabled no-op rather than failing the caller
    #[error("Connectivity error: {message}")]
    Connectivity {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Bulk write failed during a flush; the batch is dropped and the
    /// pipeline stays active
    #[error("Transmission error: {message}")]
    Transmission {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Invalid configuration; fails fast at construction
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShipperError {
    /// Create a connectivity error
    pub fn connectivity(message: impl Into<String>) -> Self {
        Self::Connectivity {
            message: message.into(),
            source: None,
        }
    }

    /// Create a connectivity error with source
    pub fn connectivity_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connectivity {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a transmission error
    pub fn transmission(message: impl Into<String>) -> Self {
        Self::Transmission {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transmission error with source
    pub fn transmission_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transmission {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}
