//! Registry of live streaming subscribers.
//!
//! A [`Subscriber`] pairs an exclusively-owned output channel with the
//! [`Scope`] it asked for. The [`SubscriberRegistry`] holds them keyed by
//! [`SubscriberId`], so transport identity and subscription metadata stay
//! separate.
//!
//! # Concurrency
//!
//! Structural mutations (`add`, `remove`) take a short lock. `for_each`
//! copies the member list under that lock and visits the copy without
//! holding it, so visitors may remove themselves (or anyone else), and
//! connections may come and go while a broadcast is in flight. A
//! subscriber added mid-pass is not guaranteed to be visited by that pass.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use sunfleet_types::{Scope, SubscriberId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// A serialized envelope ready to be written to a stream.
pub type Frame = Arc<str>;

/// Marks a subscriber whose initial tick has already been consumed.
const NO_INITIAL_TICK: u64 = u64::MAX;

/// Why a single write to a subscriber channel failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The receiving side is gone; the subscriber must be removed.
    #[error("subscriber channel closed")]
    Closed,

    /// The subscriber is not draining fast enough; this frame is dropped.
    #[error("subscriber channel full")]
    Full,
}

/// Write side of one subscriber's stream.
///
/// Writes never block: a slow consumer must not stall a broadcast cycle.
pub trait SubscriberChannel: Send + Sync {
    /// Try to hand `frame` to the transport.
    ///
    /// # Errors
    ///
    /// [`DeliveryError::Closed`] when the stream is gone,
    /// [`DeliveryError::Full`] when its buffer is full.
    fn try_deliver(&self, frame: Frame) -> Result<(), DeliveryError>;
}

impl SubscriberChannel for mpsc::Sender<Frame> {
    fn try_deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.try_send(frame).map_err(|e| match e {
            TrySendError::Closed(_) => DeliveryError::Closed,
            TrySendError::Full(_) => DeliveryError::Full,
        })
    }
}

/// One open streaming connection.
pub struct Subscriber {
    id: SubscriberId,
    scope: Scope,
    channel: Box<dyn SubscriberChannel>,
    initial_tick: AtomicU64,
}

impl Subscriber {
    /// Create a subscriber with a fresh id.
    pub fn new(scope: Scope, channel: Box<dyn SubscriberChannel>) -> Self {
        Self {
            id: SubscriberId::new(),
            scope,
            channel,
            initial_tick: AtomicU64::new(NO_INITIAL_TICK),
        }
    }

    /// Record the tick the `initial` frame was built from.
    #[must_use]
    pub fn with_initial_tick(mut self, tick: u64) -> Self {
        *self.initial_tick.get_mut() = tick;
        self
    }

    /// Tick of the `initial` frame, returned once.
    ///
    /// The first broadcast visit takes it; later calls return `None`.
    pub fn take_initial_tick(&self) -> Option<u64> {
        match self.initial_tick.swap(NO_INITIAL_TICK, Ordering::AcqRel) {
            NO_INITIAL_TICK => None,
            tick => Some(tick),
        }
    }

    /// Registry key.
    pub const fn id(&self) -> SubscriberId {
        self.id
    }

    /// Requested scope, fixed for the lifetime of the connection.
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Write one frame to the channel.
    ///
    /// # Errors
    ///
    /// Propagates the channel's [`DeliveryError`].
    pub fn deliver(&self, frame: Frame) -> Result<(), DeliveryError> {
        self.channel.try_deliver(frame)
    }
}

impl core::fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subscriber")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Concurrent set of subscribers.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    members: Mutex<BTreeMap<SubscriberId, Arc<Subscriber>>>,
}

impl SubscriberRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<SubscriberId, Arc<Subscriber>>> {
        // A panicking visitor never holds this lock, so the map is intact.
        self.members.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a subscriber. Returns its id.
    pub fn add(&self, subscriber: Subscriber) -> SubscriberId {
        let id = subscriber.id();
        self.lock().insert(id, Arc::new(subscriber));
        id
    }

    /// Remove a subscriber. Removing an absent id is a no-op.
    ///
    /// Returns whether the subscriber was present.
    pub fn remove(&self, id: SubscriberId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Whether `id` is currently registered.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.lock().contains_key(&id)
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no subscriber is registered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Visit every subscriber registered at the start of the call.
    ///
    /// The lock is released before the first visit; `visitor` may call
    /// [`remove`](Self::remove) or [`add`](Self::add) freely.
    pub fn for_each<F>(&self, mut visitor: F)
    where
        F: FnMut(&Subscriber),
    {
        let members: Vec<Arc<Subscriber>> = self.lock().values().cloned().collect();
        for subscriber in &members {
            visitor(subscriber.as_ref());
        }
    }
}
