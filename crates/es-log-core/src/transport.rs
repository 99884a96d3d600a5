//! Bulk transport strategy
//!
//! The seam between the batching pipeline and the indexing backend. The real
//! implementation is the Elasticsearch client in the shipper crate; tests and
//! alternate backends plug in their own.

use crate::error::Result;
use crate::event::ActionBatch;
use async_trait::async_trait;

/// Outcome of one bulk write
///
/// Partial document failures are reported here rather than as an error, so a
/// bulk call only errors when the request itself failed.
#[derive(Debug, Clone)]
pub struct BulkSummary {
    /// Number of documents accepted by the backend
    pub success_count: usize,
    /// Number of documents the backend rejected
    pub failure_count: usize,
    /// Rejection reasons, one per failed document
    pub failures: Vec<String>,
    /// Time taken for the write
    pub duration_ms: u64,
}

impl BulkSummary {
    /// Create a fully successful summary
    pub fn success(count: usize, duration_ms: u64) -> Self {
        Self {
            success_count: count,
            failure_count: 0,
            failures: Vec::new(),
            duration_ms,
        }
    }

    /// Check if every document was accepted
    pub fn is_complete_success(&self) -> bool {
        self.failure_count == 0
    }
}

/// Backend interface consumed by the pipeline
///
/// `ping` is the one-time reachability probe performed at construction;
/// `bulk` submits an ordered batch of documents in a single call.
#[async_trait]
pub trait BulkTransport: Send + Sync {
    /// Connectivity probe
    async fn ping(&self) -> Result<()>;

    /// Write an ordered batch of documents
    async fn bulk(&self, batch: &ActionBatch) -> Result<BulkSummary>;
}
