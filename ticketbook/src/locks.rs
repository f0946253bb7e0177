//! Per-event in-process locks.
//!
//! Workflow calls on the same event take the same lock for the duration of
//! their unit of work, so they queue instead of racing each other into the
//! ledger's retry loop. Calls on different events take different locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::event::EventId;

/// Registry of one mutex per event id.
///
/// Cloning shares the registry.
///
/// # Examples
///
/// ```
/// use ticketbook::locks::EventLocks;
/// use ticketbook::EventId;
///
/// let locks = EventLocks::new();
/// let a = locks.handle(EventId::new(1));
/// let b = locks.handle(EventId::new(2));
/// let _ga = a.lock();
/// let _gb = b.lock(); // a different event does not block
/// ```
#[derive(Debug, Clone, Default)]
pub struct EventLocks {
    inner: Arc<Mutex<HashMap<EventId, Arc<Mutex<()>>>>>,
}

/// A shared handle to one event's lock.
#[derive(Debug, Clone)]
pub struct EventLock {
    event: EventId,
    mutex: Arc<Mutex<()>>,
}

impl EventLocks {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the lock for `event`, creating it on first use.
    #[must_use]
    pub fn handle(&self, event: EventId) -> EventLock {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mutex = Arc::clone(map.entry(event).or_default());
        EventLock { event, mutex }
    }

    /// Returns the number of events that have a lock.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` if no lock has been created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventLock {
    /// Returns the event this lock guards.
    #[must_use]
    pub const fn event(&self) -> EventId {
        self.event
    }

    /// Blocks until the lock is held.
    ///
    /// Poisoning is ignored; the lock guards no data.
    pub fn lock(&self) -> MutexGuard<'_, ()> {
        self.mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
