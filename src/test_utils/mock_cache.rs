use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;

use crate::CacheEvent;
use crate::CacheEventKind;
use crate::CacheListener;
use crate::EntryUpdater;
use crate::KeyCodec;
use crate::QueryCache;
use crate::QueryKey;
use crate::QueryKeyHash;
use crate::Unsubscribe;

type Listener = Arc<dyn Fn(&CacheEvent) + Send + Sync>;

struct MockEntry {
    key: QueryKey,
    data: Option<Value>,
    observers: usize,
    invalidations: usize,
    writes: usize,
}

#[derive(Default)]
struct MockCacheState {
    entries: HashMap<QueryKeyHash, MockEntry>,
    listeners: Vec<(u64, Listener)>,
    next_listener: u64,
}

/// In-memory pull cache.
///
/// Reference counting is driven by `observe`/`unobserve`; garbage collection
/// never runs on a timer and is triggered with `gc`.
#[derive(Clone)]
pub struct MockQueryCache {
    codec: KeyCodec,
    gc_time: Duration,
    state: Arc<Mutex<MockCacheState>>,
}

impl MockQueryCache {
    pub fn new() -> Self {
        Self {
            codec: KeyCodec::default(),
            gc_time: Duration::from_secs(10),
            state: Arc::new(Mutex::new(MockCacheState::default())),
        }
    }

    pub fn hash(
        &self,
        key: &QueryKey,
    ) -> QueryKeyHash {
        self.codec.hash(key)
    }

    /// A consumer starts using `key`; emits `added` for a first reference.
    pub fn observe(
        &self,
        key: &QueryKey,
    ) -> QueryKeyHash {
        let hash = self.hash(key);
        let (added, observers) = {
            let mut state = self.state.lock();
            let added = !state.entries.contains_key(&hash);
            let entry = state.entries.entry(hash.clone()).or_insert_with(|| MockEntry {
                key: key.clone(),
                data: None,
                observers: 0,
                invalidations: 0,
                writes: 0,
            });
            entry.observers += 1;
            (added, entry.observers)
        };

        if added {
            self.emit(CacheEventKind::Added, key, 0);
        }
        self.emit(CacheEventKind::ObserverAdded, key, observers);
        hash
    }

    /// A consumer stops using `key`.
    pub fn unobserve(
        &self,
        key: &QueryKey,
    ) {
        let hash = self.hash(key);
        let observers = {
            let mut state = self.state.lock();
            match state.entries.get_mut(&hash) {
                Some(entry) => {
                    entry.observers = entry.observers.saturating_sub(1);
                    entry.observers
                }
                None => return,
            }
        };
        self.emit(CacheEventKind::ObserverRemoved, key, observers);
    }

    /// Grace period elapsed: evict `key` if unobserved and emit `removed`.
    pub fn gc(
        &self,
        key: &QueryKey,
    ) -> bool {
        let hash = self.hash(key);
        let removed = {
            let mut state = self.state.lock();
            match state.entries.get(&hash) {
                Some(entry) if entry.observers == 0 => state.entries.remove(&hash).is_some(),
                _ => false,
            }
        };
        if removed {
            self.emit(CacheEventKind::Removed, key, 0);
        }
        removed
    }

    /// Drop the entry without emitting anything yet.
    pub fn evict_silently(
        &self,
        key: &QueryKey,
    ) {
        let hash = self.hash(key);
        self.state.lock().entries.remove(&hash);
    }

    /// Result of the query function landing in the cache.
    pub fn seed(
        &self,
        key: &QueryKey,
        value: Value,
    ) {
        let hash = self.hash(key);
        {
            let mut state = self.state.lock();
            if let Some(entry) = state.entries.get_mut(&hash) {
                entry.data = Some(value);
            }
        }
        self.emit(
            CacheEventKind::Updated {
                action: "success".to_string(),
            },
            key,
            self.observers(key),
        );
    }

    pub fn emit(
        &self,
        kind: CacheEventKind,
        key: &QueryKey,
        observers_count: usize,
    ) {
        let event = CacheEvent {
            kind,
            query_key: key.clone(),
            query_hash: self.hash(key),
            observers_count,
            gc_time: self.gc_time,
        };
        let snapshot: Vec<Listener> = {
            let state = self.state.lock();
            state.listeners.iter().map(|(_, l)| Arc::clone(l)).collect()
        };
        for listener in snapshot {
            listener(&event);
        }
    }

    pub fn data(
        &self,
        key: &QueryKey,
    ) -> Option<Value> {
        let hash = self.hash(key);
        self.state.lock().entries.get(&hash).and_then(|e| e.data.clone())
    }

    pub fn observers(
        &self,
        key: &QueryKey,
    ) -> usize {
        let hash = self.hash(key);
        self.state.lock().entries.get(&hash).map(|e| e.observers).unwrap_or(0)
    }

    pub fn invalidations(
        &self,
        key: &QueryKey,
    ) -> usize {
        let hash = self.hash(key);
        self.state.lock().entries.get(&hash).map(|e| e.invalidations).unwrap_or(0)
    }

    pub fn writes(
        &self,
        key: &QueryKey,
    ) -> usize {
        let hash = self.hash(key);
        self.state.lock().entries.get(&hash).map(|e| e.writes).unwrap_or(0)
    }

    pub fn entry_count(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }
}

impl QueryCache for MockQueryCache {
    fn subscribe(
        &self,
        listener: CacheListener,
    ) -> Unsubscribe {
        let id = {
            let mut state = self.state.lock();
            state.next_listener += 1;
            let id = state.next_listener;
            state.listeners.push((id, Arc::from(listener)));
            id
        };

        let state = Arc::clone(&self.state);
        Box::new(move || {
            state.lock().listeners.retain(|(lid, _)| *lid != id);
        })
    }

    fn has_entry(
        &self,
        key: &QueryKey,
    ) -> bool {
        let hash = self.hash(key);
        self.state.lock().entries.contains_key(&hash)
    }

    fn set_entry_value(
        &self,
        key: &QueryKey,
        updater: EntryUpdater,
    ) -> bool {
        let hash = self.hash(key);
        let mut state = self.state.lock();
        let Some(entry) = state.entries.get_mut(&hash) else {
            return false;
        };
        debug_assert_eq!(&entry.key, key);

        match updater(entry.data.as_ref()) {
            Some(value) => {
                entry.data = Some(value);
                entry.writes += 1;
                true
            }
            None => false,
        }
    }

    fn invalidate(
        &self,
        key: &QueryKey,
    ) {
        let hash = self.hash(key);
        if let Some(entry) = self.state.lock().entries.get_mut(&hash) {
            entry.invalidations += 1;
        }
    }
}
