//! Background dispatcher
//!
//! A single task that drains the hand-off queue and feeds the batching sink.
//! It is the sole appender into the sink's buffer; closing the queue is the
//! stop signal and guarantees one final flush before the task exits.

use crate::sink::BatchSink;
use es_log_core::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Handle to the dispatcher task
pub struct Dispatcher {
    handle: JoinHandle<()>,
}

impl Dispatcher {
    /// Spawn the dispatcher over a receiver and a sink
    ///
    /// The loop blocks on `recv` when the queue is empty and exits when every
    /// sender is dropped, flushing whatever is still buffered on the way out.
    pub fn spawn<T: BulkTransport + 'static>(
        mut queue: mpsc::Receiver<LogEvent>,
        sink: Arc<BatchSink<T>>,
    ) -> Self {
        let handle = tokio::spawn(async move {
            debug!("dispatcher started");

            while let Some(event) = queue.recv().await {
                sink.append(event).await;
            }

            sink.close().await;
            debug!("dispatcher stopped");
        });

        Self { handle }
    }

    /// Wait for the dispatcher to drain and exit
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            error!(error = %e, "dispatcher task failed");
        }
    }
}
