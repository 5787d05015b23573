//! Pull-based query cache collaborator.
//!
//! The cache owns its entries, reference counting and garbage collection. The
//! bridge only listens to its lifecycle events and, as a privileged writer,
//! replaces or invalidates entries that already exist.

use std::fmt;
use std::time::Duration;

use serde_json::Value;

use crate::QueryKey;
use crate::QueryKeyHash;
use crate::Unsubscribe;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheEventKind {
    /// Key referenced for the first time; no entry existed before
    Added,
    /// Entry evicted after its grace period
    Removed,
    /// A consumer started observing the entry
    ObserverAdded,
    /// A consumer stopped observing the entry
    ObserverRemoved,
    /// Fires once per observer when results change
    ObserverResultsUpdated,
    /// Entry state changed through one of the cache's actions
    Updated { action: String },
    /// Observer options changed, usually an unmemoized key
    ObserverOptionsUpdated,
}

impl fmt::Display for CacheEventKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            CacheEventKind::Added => "added",
            CacheEventKind::Removed => "removed",
            CacheEventKind::ObserverAdded => "observerAdded",
            CacheEventKind::ObserverRemoved => "observerRemoved",
            CacheEventKind::ObserverResultsUpdated => "observerResultsUpdated",
            CacheEventKind::Updated { .. } => "updated",
            CacheEventKind::ObserverOptionsUpdated => "observerOptionsUpdated",
        };
        f.write_str(name)
    }
}

/// Lifecycle event emitted by the cache
#[derive(Clone, Debug)]
pub struct CacheEvent {
    pub kind: CacheEventKind,
    pub query_key: QueryKey,
    /// Hash the cache assigned to `query_key`
    pub query_hash: QueryKeyHash,
    /// Observers still attached after this event was applied
    pub observers_count: usize,
    /// Grace period before an unobserved entry is removed
    pub gc_time: Duration,
}

pub type CacheListener = Box<dyn Fn(&CacheEvent) + Send + Sync>;

/// Receives the current entry value and returns the replacement.
/// Returning `None` means "do not write".
pub type EntryUpdater = Box<dyn FnOnce(Option<&Value>) -> Option<Value> + Send>;

pub trait QueryCache: Send + Sync + 'static {
    /// Register a lifecycle listener; events are delivered in emission order
    fn subscribe(
        &self,
        listener: CacheListener,
    ) -> Unsubscribe;

    fn has_entry(
        &self,
        key: &QueryKey,
    ) -> bool;

    /// Apply `updater` to the entry for `key`.
    ///
    /// Must never create an entry when `updater` returns `None`. Returns
    /// whether a value was written.
    fn set_entry_value(
        &self,
        key: &QueryKey,
        updater: EntryUpdater,
    ) -> bool;

    /// Mark the entry invalid so the cache refetches it through its query function
    fn invalidate(
        &self,
        key: &QueryKey,
    );
}
