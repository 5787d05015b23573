//! Typed synchronous diagnostics stream.
//!
//! Listeners are stored as `Arc<dyn Fn(&BridgeEvent)>` and emission works on a
//! snapshot of the list, so a listener removed during emission is still called
//! in that round and one added during emission is not. The lock is never held
//! while a listener runs.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::BridgeError;
use crate::QueryKeyHash;
use crate::Result;

/// Bridge-level lifecycle edges, for logging and tooling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeEvent {
    /// A watch was opened for the hash
    Subscribed { hash: QueryKeyHash },
    /// The watch for the hash was detached
    Unsubscribed { hash: QueryKeyHash },
    /// The last observer detached; the cache will evict after `gc_time`
    LastObserverRemoved { hash: QueryKeyHash, gc_time: Duration },
    /// A snapshot was written into the cache entry
    Propagated { hash: QueryKeyHash },
    /// A snapshot read failed and the entry was invalidated
    Invalidated { hash: QueryKeyHash },
}

pub type ListenerId = u64;

type Listener = dyn Fn(&BridgeEvent) + Send + Sync;

pub struct DiagnosticsEmitter {
    listeners: Mutex<Vec<(ListenerId, Arc<Listener>)>>,
    next_id: AtomicU64,
    max_listeners: usize,
}

impl DiagnosticsEmitter {
    pub fn new(max_listeners: usize) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            max_listeners,
        }
    }

    /// Register `callback`.
    ///
    /// # Errors
    /// [`BridgeError::TooManyListeners`] once `max_listeners` are attached.
    pub fn on(
        &self,
        callback: impl Fn(&BridgeEvent) + Send + Sync + 'static,
    ) -> Result<ListenerId> {
        let mut listeners = self.listeners.lock();
        if listeners.len() >= self.max_listeners {
            return Err(BridgeError::TooManyListeners {
                max: self.max_listeners,
            }
            .into());
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        listeners.push((id, Arc::new(callback)));
        Ok(id)
    }

    /// Safe to call more than once for the same id.
    pub fn off(
        &self,
        id: ListenerId,
    ) {
        self.listeners.lock().retain(|(lid, _)| *lid != id);
    }

    pub fn emit(
        &self,
        event: &BridgeEvent,
    ) {
        let snapshot: Vec<Arc<Listener>> = {
            let guard = self.listeners.lock();
            guard.iter().map(|(_, cb)| Arc::clone(cb)).collect()
        };
        for cb in snapshot {
            cb(event);
        }
    }

    pub fn size(&self) -> usize {
        self.listeners.lock().len()
    }
}
