//! # ES Log Shipper
//!
//! Asynchronous, batched log shipping to Elasticsearch.
//!
//! Producers hand events to the [`ElasticHandler`]; a bounded queue, a single
//! dispatcher task, and a size/time triggered [`BatchSink`] move them to the
//! cluster via the `_bulk` API without blocking producers on network latency.
//!
//! ```text
//! producer ──► ElasticHandler::enqueue ──► bounded queue ──► Dispatcher
//!                                                                │
//!                                              BatchSink ◄───────┘
//!                                                  │  (size or timer trigger)
//!                                                  ▼
//!                                          EsClient::bulk ──► Elasticsearch
//! ```
//!
//! Delivery is best-effort and at-most-once: a batch whose bulk write fails is
//! reported and dropped, and the pipeline keeps shipping subsequent batches.

pub mod client;
pub mod dispatcher;
pub mod handler;
pub mod sink;

pub use client::{EsClient, EsClientConfig};
pub use dispatcher::Dispatcher;
pub use handler::{ElasticHandler, HandlerState};
pub use sink::BatchSink;

pub use es_log_core::config::ShipperConfig;
pub use es_log_core::error::{Result, ShipperError};
pub use es_log_core::event::{Action, ActionBatch, Level, LogEvent};
pub use es_log_core::transport::{BulkSummary, BulkTransport};
