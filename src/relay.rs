//! The subscriber registry and fan-out sweep. Grounded on
//! `oidc-discovery-server::AppState`'s `Arc`-shared pattern for the overall
//! state shape, generalized from one shared value to a concurrent map of
//! many (the registry itself is a `dashmap::DashMap`, imported for this
//! exact "iterate while concurrently mutated" shape per DESIGN.md).

use crate::predicate::Predicate;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;

/// Outbound channel capacity per subscriber. A full queue is treated as a
/// send failure rather than a reason to stall the fan-out sweep (§5).
const OUTBOUND_QUEUE_CAPACITY: usize = 256;

pub type SubscriberId = u64;

/// A single subscriber's live state: its current predicate and the sender
/// half of its outbound queue. The receive half lives with the transport
/// task that owns the WebSocket connection.
struct Subscriber {
    predicate: RwLock<Arc<Predicate>>,
    outbound: mpsc::Sender<Arc<String>>,
}

/// The shared subscriber registry and fan-out engine. One instance per
/// process, held in `Arc<AppState>` alongside the retention store.
pub struct Relay {
    subscribers: DashMap<SubscriberId, Subscriber>,
    next_id: AtomicU64,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Relay {
        Relay {
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new subscriber with the default predicate (`All[]`,
    /// matching everything) and returns its id plus the receive half of its
    /// outbound queue. The caller's transport task owns the returned
    /// receiver for the subscriber's lifetime and must call
    /// [`Relay::remove`] when the connection ends.
    pub fn register(&self) -> (SubscriberId, mpsc::Receiver<Arc<String>>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.subscribers.insert(
            id,
            Subscriber {
                predicate: RwLock::new(Arc::new(Predicate::match_all())),
                outbound: tx,
            },
        );
        tracing::debug!(subscriber = id, "subscriber opened");
        (id, rx)
    }

    /// Parses `description` into a predicate and atomically installs it as
    /// `id`'s current predicate. On a malformed description, the subscriber
    /// is torn down instead (moved to `Closing`) and `Err` is returned so
    /// the caller can close the connection.
    pub fn update_predicate(
        &self,
        id: SubscriberId,
        description: &Value,
    ) -> Result<(), crate::error::PredicateError> {
        let predicate = Predicate::from_description(description)?;
        if let Some(entry) = self.subscribers.get(&id) {
            *entry.predicate.write().expect("predicate lock poisoned") = Arc::new(predicate);
            tracing::debug!(subscriber = id, "predicate updated");
        }
        Ok(())
    }

    /// Removes a subscriber from the registry. Safe to call more than once
    /// or for an id that was never registered.
    pub fn remove(&self, id: SubscriberId) {
        if self.subscribers.remove(&id).is_some() {
            tracing::debug!(subscriber = id, "subscriber closed");
        }
    }

    /// Evaluates `event` against every currently active subscriber's
    /// predicate and enqueues the (once-serialized) JSON text to every
    /// match. A subscriber whose outbound queue is full, or whose receiver
    /// has dropped, is removed — this does not affect delivery to any
    /// other subscriber.
    pub fn process_event(&self, event: &Value) {
        let serialized = match serde_json::to_string(event) {
            Ok(s) => Arc::new(s),
            Err(err) => {
                tracing::warn!(error = %err, "failed to serialize event for fan-out");
                return;
            }
        };

        let mut to_remove = Vec::new();
        for entry in self.subscribers.iter() {
            let id = *entry.key();
            let predicate = entry.predicate.read().expect("predicate lock poisoned").clone();
            if !predicate.matches(event) {
                continue;
            }
            if entry.outbound.try_send(serialized.clone()).is_err() {
                to_remove.push(id);
            }
        }

        for id in to_remove {
            self.remove(id);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
