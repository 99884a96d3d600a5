//! # ES Log Core
//!
//! Core types, transport trait, and configuration for the ES log shipper.
//!
//! This crate defines the leaf pieces the batching pipeline is built from:
//! - Log events and the backend-ready actions derived from them
//! - The `BulkTransport` strategy seam to the indexing backend
//! - Configuration, errors, and metrics

pub mod config;
pub mod error;
pub mod event;
pub mod metrics;
pub mod transport;

pub use self::config::*;
pub use self::error::*;
pub use self::event::*;
pub use self::metrics::*;
pub use self::transport::*;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::ShipperConfig;
    pub use crate::error::{Result, ShipperError};
    pub use crate::event::{Action, ActionBatch, BulkOp, Level, LogEvent};
    pub use crate::metrics::ShipperMetrics;
    pub use crate::transport::{BulkSummary, BulkTransport};
}
