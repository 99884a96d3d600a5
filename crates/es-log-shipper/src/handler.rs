//! Front door handler
//!
//! The object producers talk to. Construction probes the backend once and
//! wires queue → dispatcher → sink on success; on an unset target or a failed
//! probe the handler degrades to an explicit disabled state in which enqueue
//! is a no-op, so the caller's logging keeps working without shipping.

use crate::client::{EsClient, EsClientConfig};
use crate::dispatcher::Dispatcher;
use crate::sink::BatchSink;
use es_log_core::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Observable handler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// Probe failed or no target configured; enqueue is a no-op
    Disabled,
    /// Pipeline running
    Active,
    /// Shut down; no transition leaves this state
    Closed,
}

struct Pipeline<T> {
    queue: mpsc::Sender<LogEvent>,
    dispatcher: Dispatcher,
    /// Owned for the handler's whole lifetime, dropped exactly once at shutdown
    transport: Arc<T>,
}

enum State<T> {
    Disabled,
    Active(Pipeline<T>),
    Closed,
}

/// Batched Elasticsearch log handler
pub struct ElasticHandler<T = EsClient> {
    state: State<T>,
    min_level: Level,
    metrics: ShipperMetrics,
}

impl<T> std::fmt::Debug for ElasticHandler<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.state {
            State::Disabled => HandlerState::Disabled,
            State::Active(_) => HandlerState::Active,
            State::Closed => HandlerState::Closed,
        };
        f.debug_struct("ElasticHandler")
            .field("state", &state)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

impl ElasticHandler<EsClient> {
    /// Build the handler against the configured Elasticsearch cluster
    ///
    /// Invalid configuration fails fast. An unreachable cluster does not:
    /// the failure is reported once and the handler comes up disabled.
    pub async fn connect(config: ShipperConfig) -> Result<Self> {
        config.validate()?;

        if config.url.as_deref().map_or(true, str::is_empty) {
            error!("no Elasticsearch url configured, log shipping disabled");
            return Ok(Self::disabled(config.min_level));
        }

        let client = match EsClient::new(EsClientConfig::from_config(&config)) {
            Ok(client) => Arc::new(client),
            Err(e) => {
                error!(error = %e, "failed to build Elasticsearch client, log shipping disabled");
                return Ok(Self::disabled(config.min_level));
            }
        };

        Self::with_transport(config, client).await
    }
}

impl<T: BulkTransport + 'static> ElasticHandler<T> {
    /// Build the handler over any bulk transport
    ///
    /// Same probe-then-wire semantics as [`ElasticHandler::connect`]; the
    /// strategy seam used by tests and alternate backends.
    pub async fn with_transport(config: ShipperConfig, transport: Arc<T>) -> Result<Self> {
        config.validate()?;

        match transport.ping().await {
            Ok(()) => Self::start(config, transport),
            Err(e) => {
                error!(error = %e, "cannot reach Elasticsearch, log shipping disabled");
                Ok(Self::disabled(config.min_level))
            }
        }
    }

    fn disabled(min_level: Level) -> Self {
        Self {
            state: State::Disabled,
            min_level,
            metrics: ShipperMetrics::new("handler"),
        }
    }

    fn start(config: ShipperConfig, transport: Arc<T>) -> Result<Self> {
        let timezone = config.timezone()?;
        let (queue, rx) = mpsc::channel(config.queue_capacity);

        let sink = Arc::new(BatchSink::new(
            Arc::clone(&transport),
            config.index.clone(),
            timezone,
            config.batch_size,
            config.flush_period,
        ));
        let dispatcher = Dispatcher::spawn(rx, sink);

        info!(
            index = %config.index,
            batch_size = config.batch_size,
            flush_period = ?config.flush_period,
            "log shipper started"
        );

        Ok(Self {
            state: State::Active(Pipeline {
                queue,
                dispatcher,
                transport,
            }),
            min_level: config.min_level,
            metrics: ShipperMetrics::new("handler"),
        })
    }

    /// Push an event onto the hand-off queue
    ///
    /// Suspends only when the queue is at capacity (backpressure, never
    /// drop-on-full). A no-op in the disabled and closed states; backend
    /// trouble never surfaces here.
    pub async fn enqueue(&self, event: LogEvent) {
        let State::Active(pipeline) = &self.state else {
            self.metrics.record_dropped("inactive");
            return;
        };

        if event.level < self.min_level {
            self.metrics.record_dropped("level");
            return;
        }

        if pipeline.queue.send(event).await.is_err() {
            warn!("dispatcher gone, dropping event");
            self.metrics.record_dropped("queue_closed");
            return;
        }
        self.metrics.record_enqueued();
    }

    /// [`enqueue`](Self::enqueue) for non-async producer threads
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_enqueue(&self, event: LogEvent) {
        let State::Active(pipeline) = &self.state else {
            self.metrics.record_dropped("inactive");
            return;
        };

        if event.level < self.min_level {
            self.metrics.record_dropped("level");
            return;
        }

        if pipeline.queue.blocking_send(event).is_err() {
            warn!("dispatcher gone, dropping event");
            self.metrics.record_dropped("queue_closed");
            return;
        }
        self.metrics.record_enqueued();
    }

    /// Stop the pipeline
    ///
    /// Idempotent. Closing the queue interrupts a blocked dispatcher pop;
    /// joining the dispatcher guarantees one final flush of everything
    /// buffered before the client handle is dropped.
    pub async fn shutdown(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Active(pipeline) => {
                let Pipeline {
                    queue,
                    dispatcher,
                    transport,
                } = pipeline;

                drop(queue);
                dispatcher.join().await;
                drop(transport);

                info!("log shipper stopped");
            }
            State::Disabled => debug!("closing disabled log shipper"),
            State::Closed => {}
        }
    }

    /// Current state, for inspection
    pub fn state(&self) -> HandlerState {
        match self.state {
            State::Disabled => HandlerState::Disabled,
            State::Active(_) => HandlerState::Active,
            State::Closed => HandlerState::Closed,
        }
    }

    /// Check if the pipeline is shipping
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct MockTransport {
        ping_ok: bool,
        bulk_calls: AtomicUsize,
        batches: Mutex<Vec<Vec<String>>>,
    }

    impl MockTransport {
        fn new(ping_ok: bool) -> Arc<Self> {
            Arc::new(Self {
                ping_ok,
                bulk_calls: AtomicUsize::new(0),
                batches: Mutex::new(Vec::new()),
            })
        }

        async fn messages(&self) -> Vec<Vec<String>> {
            self.batches.lock().await.clone()
        }
    }

    #[async_trait]
    impl BulkTransport for MockTransport {
        async fn ping(&self) -> Result<()> {
            if self.ping_ok {
                Ok(())
            } else {
                Err(ShipperError::connectivity("probe refused"))
            }
        }

        async fn bulk(&self, batch: &ActionBatch) -> Result<BulkSummary> {
            self.bulk_calls.fetch_add(1, Ordering::SeqCst);
            let messages = batch.iter().map(|a| a.message.clone()).collect();
            self.batches.lock().await.push(messages);
            Ok(BulkSummary::success(batch.len(), 0))
        }
    }

    fn test_config(batch_size: usize) -> ShipperConfig {
        ShipperConfig {
            index: "test-logs".to_string(),
            batch_size,
            flush_period: Duration::from_secs(60),
            queue_capacity: 16,
            timezone: String::new(),
            ..Default::default()
        }
    }

    /// Yield until the dispatcher has caught up with the predicate
    async fn wait_for<F: Fn() -> bool>(predicate: F) {
        for _ in 0..1000 {
            if predicate() {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("condition not reached");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_probe_disables_without_erroring() {
        let transport = MockTransport::new(false);
        let mut handler = ElasticHandler::with_transport(test_config(1), Arc::clone(&transport))
            .await
            .unwrap();

        assert_eq!(handler.state(), HandlerState::Disabled);
        assert!(!handler.is_active());

        handler.enqueue(LogEvent::new(Level::Error, "ignored")).await;
        handler.shutdown().await;

        assert_eq!(handler.state(), HandlerState::Closed);
        assert_eq!(transport.bulk_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn missing_url_disables_the_real_client_path() {
        let config = ShipperConfig {
            url: None,
            ..test_config(1)
        };
        let handler = ElasticHandler::connect(config).await.unwrap();
        assert_eq!(handler.state(), HandlerState::Disabled);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_config_fails_fast_even_with_reachable_backend() {
        let config = ShipperConfig {
            batch_size: 0,
            ..test_config(1)
        };
        let err = ElasticHandler::with_transport(config, MockTransport::new(true))
            .await
            .unwrap_err();
        assert!(matches!(err, ShipperError::Configuration { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn full_batches_ship_immediately_and_remainder_at_shutdown() {
        let transport = MockTransport::new(true);
        let mut handler = ElasticHandler::with_transport(test_config(3), Arc::clone(&transport))
            .await
            .unwrap();
        assert!(handler.is_active());

        for msg in ["e1", "e2", "e3", "e4"] {
            handler.enqueue(LogEvent::new(Level::Info, msg)).await;
        }

        // the first three fill a batch and go out without waiting on the timer
        wait_for(|| transport.bulk_calls.load(Ordering::SeqCst) == 1).await;
        assert_eq!(transport.messages().await, vec![vec!["e1", "e2", "e3"]]);

        handler.shutdown().await;
        assert_eq!(
            transport.messages().await,
            vec![vec!["e1", "e2", "e3"], vec!["e4"]]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn min_level_filters_at_the_front_door() {
        let transport = MockTransport::new(true);
        let config = ShipperConfig {
            min_level: Level::Warn,
            ..test_config(1)
        };
        let mut handler = ElasticHandler::with_transport(config, Arc::clone(&transport))
            .await
            .unwrap();

        handler.enqueue(LogEvent::new(Level::Info, "quiet")).await;
        handler.enqueue(LogEvent::new(Level::Error, "loud")).await;
        handler.shutdown().await;

        assert_eq!(transport.messages().await, vec![vec!["loud"]]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_is_idempotent_and_final() {
        let transport = MockTransport::new(true);
        let mut handler = ElasticHandler::with_transport(test_config(3), Arc::clone(&transport))
            .await
            .unwrap();

        handler.enqueue(LogEvent::new(Level::Info, "pending")).await;
        handler.shutdown().await;
        handler.shutdown().await;
        assert_eq!(handler.state(), HandlerState::Closed);

        // pending event went out in exactly one final flush
        assert_eq!(transport.messages().await, vec![vec!["pending"]]);

        // no further writes after close
        handler.enqueue(LogEvent::new(Level::Error, "late")).await;
        assert_eq!(transport.bulk_calls.load(Ordering::SeqCst), 1);
    }
}
