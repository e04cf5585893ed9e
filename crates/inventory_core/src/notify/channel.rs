//! Locator-keyed change notification registry.
//!
//! # Responsibility
//! - Register subscriber interest in a locator.
//! - Wake every subscriber whose locator overlaps a changed locator.
//!
//! # Invariants
//! - `notify` never blocks: delivery uses `try_send` on bounded channels.
//! - A full subscriber already has a pending wake-up; extra ones are dropped.
//! - Disconnected subscribers are pruned during `notify`.
//! - Subscriptions live until cancelled or dropped by their holder.

use crate::route::uri::ContentUri;
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::debug;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

const DEFAULT_SUBSCRIBER_CAPACITY: usize = 16;

/// Signal that data under `uri` changed. Subscribers re-query for the new state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub uri: ContentUri,
}

struct Subscriber {
    uri: ContentUri,
    sender: Sender<ChangeEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    subscribers: Mutex<BTreeMap<u64, Subscriber>>,
}

impl Registry {
    fn subscribers(&self) -> MutexGuard<'_, BTreeMap<u64, Subscriber>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// Publish/subscribe service injected into the record access service.
pub struct ChangeNotifier {
    registry: Arc<Registry>,
    capacity: usize,
}

impl ChangeNotifier {
    /// Creates a notifier whose subscribers buffer up to `capacity` pending events.
    pub fn new(capacity: usize) -> Self {
        Self {
            registry: Arc::new(Registry::default()),
            capacity: capacity.max(1),
        }
    }

    /// Registers interest in `uri` and everything it contains or is contained by.
    pub fn subscribe(&self, uri: &ContentUri) -> Subscription {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = bounded(self.capacity);
        self.registry.subscribers().insert(
            id,
            Subscriber {
                uri: uri.clone(),
                sender,
            },
        );

        Subscription {
            id,
            uri: uri.clone(),
            receiver,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Wakes subscribers of `uri`, of its ancestors and of its descendants.
    ///
    /// Returns the number of subscribers that received the event.
    pub fn notify(&self, uri: &ContentUri) -> usize {
        let mut delivered = 0;
        let mut disconnected = Vec::new();
        let mut subscribers = self.registry.subscribers();

        for (id, subscriber) in subscribers.iter() {
            if !subscriber.uri.overlaps(uri) {
                continue;
            }
            let event = ChangeEvent { uri: uri.clone() };
            match subscriber.sender.try_send(event) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("event=notify_skip module=notify status=ok reason=pending subscription={id}");
                }
                Err(TrySendError::Disconnected(_)) => disconnected.push(*id),
            }
        }

        for id in disconnected {
            subscribers.remove(&id);
        }
        delivered
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.registry.subscribers().len()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_CAPACITY)
    }
}

/// Handle for one registered interest. Dropping it stops delivery.
pub struct Subscription {
    id: u64,
    uri: ContentUri,
    receiver: Receiver<ChangeEvent>,
    registry: Weak<Registry>,
}

impl Subscription {
    pub fn uri(&self) -> &ContentUri {
        &self.uri
    }

    /// Returns a pending event without waiting.
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Discards pending events and returns how many there were.
    pub fn drain(&self) -> usize {
        self.receiver.try_iter().count()
    }

    /// Receiver side for callers that multiplex with `crossbeam::select!`.
    pub fn receiver(&self) -> &Receiver<ChangeEvent> {
        &self.receiver
    }

    /// Stops listening.
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.subscribers().remove(&self.id);
        }
    }
}
