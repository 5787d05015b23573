//! One live watch per reactive query hash.
//!
//! The set of open hashes mirrors the set of reactive entries the pull cache
//! considers live: [`SubscriptionRegistry::open`] runs on the cache's `added`
//! edge and [`SubscriptionRegistry::close`] on its `removed` edge.

mod subscription;
pub use subscription::*;


use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::ConsistencyError;
use crate::QueryKey;
use crate::QueryKeyHash;
use crate::ReactiveClient;
use crate::Result;
use crate::Watch;

/// Called from a watch's update callback with the hash and id it was opened with
pub type UpdateNotifier = Arc<dyn Fn(&QueryKeyHash, SubscriptionId) + Send + Sync>;

#[derive(Debug)]
pub enum OpenOutcome {
    /// A new watch was created
    Opened(Arc<Subscription>),
    /// A subscription for the hash already existed and was left untouched
    AlreadyOpen(Arc<Subscription>),
}

impl OpenOutcome {
    pub fn subscription(&self) -> &Arc<Subscription> {
        match self {
            OpenOutcome::Opened(s) | OpenOutcome::AlreadyOpen(s) => s,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, OpenOutcome::Opened(_))
    }
}

pub struct SubscriptionRegistry {
    subscriptions: DashMap<QueryKeyHash, Arc<Subscription>>,
    client: Arc<dyn ReactiveClient>,
    notifier: UpdateNotifier,
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub fn new(
        client: Arc<dyn ReactiveClient>,
        notifier: UpdateNotifier,
        initial_capacity: usize,
    ) -> Self {
        Self {
            subscriptions: DashMap::with_capacity(initial_capacity),
            client,
            notifier,
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a watch for `query_key` unless `hash` already has one.
    ///
    /// A second open for the same hash is logged and returns the existing
    /// subscription; it never creates a second watch.
    ///
    /// # Errors
    /// [`ConsistencyError::NotReactive`] if `query_key` is opaque.
    pub fn open(
        &self,
        hash: QueryKeyHash,
        query_key: QueryKey,
    ) -> Result<OpenOutcome> {
        if let Some(existing) = self.get(&hash) {
            warn!("[:SubscriptionRegistry:open] subscription for {} already exists", hash);
            return Ok(OpenOutcome::AlreadyOpen(existing));
        }

        let reactive = query_key
            .as_reactive()
            .ok_or_else(|| ConsistencyError::NotReactive { hash: hash.clone() })?;
        let args = reactive.canonical_args();
        let watch: Arc<dyn Watch> = Arc::from(self.client.watch_query(reactive.function, &args));

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notifier = Arc::clone(&self.notifier);
        let callback_hash = hash.clone();
        let detach = watch.on_update(Box::new(move || notifier(&callback_hash, id)));

        let subscription = Arc::new(Subscription::new(id, hash.clone(), query_key, watch, detach));

        // The map guard must be gone before a raced duplicate is released.
        let raced = match self.subscriptions.entry(hash.clone()) {
            Entry::Occupied(occupied) => Some(Arc::clone(occupied.get())),
            Entry::Vacant(vacant) => {
                vacant.insert(Arc::clone(&subscription));
                None
            }
        };

        match raced {
            Some(existing) => {
                warn!("[:SubscriptionRegistry:open] lost race opening {}, releasing duplicate watch", hash);
                subscription.release();
                Ok(OpenOutcome::AlreadyOpen(existing))
            }
            None => {
                info!("[:SubscriptionRegistry:open] subscribed to {} (id={})", hash, id);
                Ok(OpenOutcome::Opened(subscription))
            }
        }
    }

    /// Detach and forget the subscription for `hash`.
    ///
    /// No update for `hash` is delivered by this subscription once `close`
    /// returns.
    ///
    /// # Errors
    /// [`ConsistencyError::UnknownSubscription`] if nothing is open for
    /// `hash`; the registry and the cache have desynchronized.
    pub fn close(
        &self,
        hash: &QueryKeyHash,
    ) -> Result<()> {
        let (_, subscription) =
            self.subscriptions
                .remove(hash)
                .ok_or_else(|| ConsistencyError::UnknownSubscription {
                    hash: hash.clone(),
                    operation: "close",
                })?;

        subscription.release();
        info!("[:SubscriptionRegistry:close] unsubscribed from {} (id={})", hash, subscription.id());
        Ok(())
    }

    /// Close everything; returns the closed hashes in order.
    pub fn close_all(&self) -> Vec<QueryKeyHash> {
        let hashes = self.hashes();
        let mut closed = Vec::with_capacity(hashes.len());
        for hash in hashes {
            if let Some((_, subscription)) = self.subscriptions.remove(&hash) {
                subscription.release();
                closed.push(hash);
            }
        }
        debug!("[:SubscriptionRegistry:close_all] closed {} subscriptions", closed.len());
        closed
    }

    pub fn get(
        &self,
        hash: &QueryKeyHash,
    ) -> Option<Arc<Subscription>> {
        self.subscriptions.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Whether `id` is still the live subscription for `hash`
    pub fn is_current(
        &self,
        hash: &QueryKeyHash,
        id: SubscriptionId,
    ) -> bool {
        self.subscriptions
            .get(hash)
            .map(|entry| entry.value().id() == id)
            .unwrap_or(false)
    }

    /// Open hashes, sorted
    pub fn hashes(&self) -> Vec<QueryKeyHash> {
        let mut hashes: Vec<QueryKeyHash> = self.subscriptions.iter().map(|entry| entry.key().clone()).collect();
        hashes.sort();
        hashes
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }
}
