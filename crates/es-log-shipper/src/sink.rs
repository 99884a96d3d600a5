//! Size/time triggered batching sink
//!
//! Owns the action buffer and the single-shot flush timer, and performs the
//! bulk write. Backend failures are absorbed here: a failed batch is dropped
//! and reported, never re-queued, and never surfaced to producers.

use chrono_tz::Tz;
use es_log_core::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// Buffer plus timer handle, guarded by one lock
///
/// The lock is held only for append/swap bookkeeping, never across the
/// network call, so a slow bulk write cannot block a concurrent append.
struct SinkState {
    buffer: ActionBatch,
    /// At most one live timer; retired (aborted or already fired) before a
    /// new one is armed
    timer: Option<JoinHandle<()>>,
}

/// Batching sink over any bulk transport
pub struct BatchSink<T> {
    transport: Arc<T>,
    index: String,
    timezone: Option<Tz>,
    batch_size: usize,
    flush_period: Duration,
    state: Mutex<SinkState>,
    metrics: ShipperMetrics,
}

impl<T: BulkTransport + 'static> BatchSink<T> {
    pub fn new(
        transport: Arc<T>,
        index: impl Into<String>,
        timezone: Option<Tz>,
        batch_size: usize,
        flush_period: Duration,
    ) -> Self {
        Self {
            transport,
            index: index.into(),
            timezone,
            batch_size,
            flush_period,
            state: Mutex::new(SinkState {
                buffer: ActionBatch::with_capacity(batch_size),
                timer: None,
            }),
            metrics: ShipperMetrics::new("batch_sink"),
        }
    }

    /// Append one event to the buffer
    ///
    /// Builds the action at append time. Reaching `batch_size` flushes
    /// synchronously; otherwise the flush timer is armed if not already.
    pub async fn append(self: &Arc<Self>, event: LogEvent) {
        let action = Action::build(&event, &self.index, self.timezone);

        let size_triggered = {
            let mut state = self.state.lock().await;
            state.buffer.push(action);
            self.metrics.set_buffer_size(state.buffer.len());

            if state.buffer.len() >= self.batch_size {
                true
            } else {
                if state.timer.is_none() {
                    state.timer = Some(self.spawn_timer());
                }
                false
            }
        };

        if size_triggered {
            self.flush().await;
        }
    }

    /// Arm the single-shot flush timer
    ///
    /// The timer clears its own slot before flushing, so a concurrent flush
    /// never aborts a timer that is already mid-flush.
    fn spawn_timer(self: &Arc<Self>) -> JoinHandle<()> {
        let sink = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(sink.flush_period).await;
            sink.state.lock().await.timer = None;
            sink.flush().await;
        })
    }

    /// Flush the buffered batch to the backend
    ///
    /// Retires any pending timer and swaps the buffer out atomically under
    /// the lock; the bulk write happens outside it. A flush on an empty
    /// buffer is a guaranteed no-op, so redundant triggers are harmless.
    /// On failure the batch is dropped (at-most-once delivery) and the
    /// error goes to the local error channel only.
    pub async fn flush(&self) {
        let batch = {
            let mut state = self.state.lock().await;
            if let Some(timer) = state.timer.take() {
                timer.abort();
            }
            std::mem::take(&mut state.buffer)
        };
        self.metrics.set_buffer_size(0);

        if batch.is_empty() {
            return;
        }

        let count = batch.len();
        self.metrics.record_bulk_request();

        match self.transport.bulk(&batch).await {
            Ok(summary) => {
                self.metrics
                    .record_docs_shipped(summary.success_count as u64, &self.index);
                self.metrics
                    .record_bulk_latency(Duration::from_millis(summary.duration_ms));

                if summary.failure_count > 0 {
                    self.metrics
                        .record_docs_failed(summary.failure_count as u64, "rejected");
                    warn!(
                        rejected = summary.failure_count,
                        index = %self.index,
                        "bulk write rejected documents"
                    );
                    for reason in &summary.failures {
                        debug!(reason, "document rejected");
                    }
                } else {
                    debug!(count, index = %self.index, "batch shipped");
                }
            }
            Err(e) => {
                self.metrics.record_docs_failed(count as u64, "transmission");
                error!(error = %e, count, index = %self.index, "bulk write failed, dropping batch");
            }
        }
    }

    /// Final flush; the sink holds no other resources
    pub async fn close(&self) {
        self.flush().await;
    }

    /// Current buffer depth
    pub async fn buffered(&self) -> usize {
        self.state.lock().await.buffer.len()
    }
}
