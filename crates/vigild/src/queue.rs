//! Bounded hand-off from transport reception loops to the tick loop.
//!
//! Many producers (one per transport adapter), exactly one consumer (the
//! driver). The push side never blocks and never fails loudly: when the
//! queue is full the incoming message is dropped (drop-newest, which
//! preserves FIFO ordering of the alerts already accepted) and a counter
//! is incremented. The consumer drains the whole batch once per tick.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use vigil_core::RawMessage;

/// Default queue capacity; see `TickConfig::queue_capacity`.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Creates a bounded event queue.
pub fn event_queue(capacity: usize) -> (QueuePusher, QueueDrain) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));

    (
        QueuePusher {
            tx,
            dropped: Arc::clone(&dropped),
        },
        QueueDrain {
            rx,
            capacity: capacity.max(1),
            dropped,
        },
    )
}

/// Producer half; cheap to clone, one per reception loop.
#[derive(Clone)]
pub struct QueuePusher {
    tx: mpsc::Sender<RawMessage>,
    dropped: Arc<AtomicU64>,
}

impl QueuePusher {
    /// Enqueues a message without blocking.
    ///
    /// On overflow the message is dropped and counted; warnings are
    /// throttled to power-of-two counts so a stalled consumer cannot
    /// flood the log.
    pub fn push(&self, msg: RawMessage) {
        match self.tx.try_send(msg) {
            Ok(()) => {}
            Err(TrySendError::Full(msg)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if total.is_power_of_two() {
                    warn!(
                        source = %msg.source,
                        dropped_total = total,
                        "Event queue full, dropping message"
                    );
                } else {
                    debug!(source = %msg.source, "Event queue full, dropping message");
                }
            }
            Err(TrySendError::Closed(msg)) => {
                // Consumer is gone (shutdown); nothing useful to do.
                debug!(source = %msg.source, "Event queue closed, discarding message");
            }
        }
    }

    /// Total messages dropped due to overflow since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Consumer half; owned by the driver.
pub struct QueueDrain {
    rx: mpsc::Receiver<RawMessage>,
    capacity: usize,
    dropped: Arc<AtomicU64>,
}

impl QueueDrain {
    /// Returns everything currently queued, in arrival order.
    ///
    /// The batch is bounded by the queue capacity, so one tick can never
    /// process more than one queue's worth of messages.
    pub fn drain_all(&mut self) -> Vec<RawMessage> {
        let mut batch = Vec::new();
        while batch.len() < self.capacity {
            match self.rx.try_recv() {
                Ok(msg) => batch.push(msg),
                Err(_) => break,
            }
        }
        batch
    }

    /// Total messages dropped due to overflow since startup.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
