// crates/server/src/fanout.rs
//! Real-time subscriber registry.
//!
//! Each WebSocket connection registers a bounded sender; a forwarding task
//! owned by the connection drains it into the socket. Broadcasting never
//! waits: a subscriber whose queue is full is dropped, which closes its
//! connection.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, info, warn};
use watchtower_core::ChangeEvent;

pub type SubscriberId = u64;

/// Messages a subscriber may have pending before it is dropped.
pub const SUBSCRIBER_QUEUE: usize = 256;

/// A connected real-time client.
pub struct Subscriber {
    pub tx: mpsc::Sender<String>,
    pub connected_at: std::time::Instant,
}

#[derive(Default)]
pub struct Fanout {
    subscribers: DashMap<SubscriberId, Subscriber>,
    next_id: AtomicU64,
}

impl Fanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. Messages broadcast from now on are queued
    /// on the returned receiver.
    pub fn subscribe(&self) -> (SubscriberId, mpsc::Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE);
        self.subscribers.insert(
            id,
            Subscriber {
                tx,
                connected_at: std::time::Instant::now(),
            },
        );
        info!(subscriber = id, "subscriber connected");
        (id, rx)
    }

    pub fn unsubscribe(&self, id: SubscriberId) {
        if let Some((_, sub)) = self.subscribers.remove(&id) {
            info!(
                subscriber = id,
                connected_secs = sub.connected_at.elapsed().as_secs(),
                "subscriber disconnected"
            );
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Queue `event` for every current subscriber and return how many
    /// accepted it. Closed and lagging subscribers are pruned.
    pub fn broadcast(&self, event: &ChangeEvent) -> usize {
        let message = match serde_json::to_string(event) {
            Ok(m) => m,
            Err(e) => {
                error!(error = %e, path = %event.path, "failed to encode change event");
                return 0;
            }
        };

        // Snapshot first so no map shard stays locked while sending.
        let targets: Vec<(SubscriberId, mpsc::Sender<String>)> = self
            .subscribers
            .iter()
            .map(|entry| (*entry.key(), entry.value().tx.clone()))
            .collect();

        let mut delivered = 0;
        for (id, tx) in targets {
            match tx.try_send(message.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(subscriber = id, "subscriber queue full, dropping");
                    self.subscribers.remove(&id);
                }
                Err(TrySendError::Closed(_)) => {
                    self.subscribers.remove(&id);
                }
            }
        }
        delivered
    }
}
