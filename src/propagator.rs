//! Writes watch snapshots into pull-cache entries.

use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use crate::ConsistencyError;
use crate::QueryCache;
use crate::QueryKeyHash;
use crate::Result;
use crate::Subscription;
use crate::SubscriptionRegistry;

/// What a single update did to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    /// Entry value replaced with the snapshot
    Written,
    /// Snapshot unavailable; entry marked invalid for refetch
    Invalidated,
    /// No entry (or no data yet); nothing written
    Skipped,
}

pub struct UpdatePropagator {
    cache: Arc<dyn QueryCache>,
    registry: Arc<SubscriptionRegistry>,
}

impl UpdatePropagator {
    pub fn new(
        cache: Arc<dyn QueryCache>,
        registry: Arc<SubscriptionRegistry>,
    ) -> Self {
        Self { cache, registry }
    }

    /// Propagate the current snapshot for `hash`.
    ///
    /// # Errors
    /// [`ConsistencyError::UnknownSubscription`] if `hash` has no open
    /// subscription.
    pub fn on_update(
        &self,
        hash: &QueryKeyHash,
    ) -> Result<Propagation> {
        let subscription = self
            .registry
            .get(hash)
            .ok_or_else(|| ConsistencyError::UnknownSubscription {
                hash: hash.clone(),
                operation: "on_update",
            })?;

        Ok(self.propagate(&subscription))
    }

    /// Performs at most one of: one entry write, one invalidate.
    pub fn propagate(
        &self,
        subscription: &Subscription,
    ) -> Propagation {
        let key = subscription.query_key();
        let hash = subscription.hash();

        // Never resurrect an evicted entry.
        if !self.cache.has_entry(key) {
            debug!("[:UpdatePropagator:propagate] no cache entry for {}, skipping", hash);
            return Propagation::Skipped;
        }

        match subscription.snapshot() {
            Ok(value) => {
                // The entry may vanish between the check and the write; the
                // updater declines to create one.
                let written = self
                    .cache
                    .set_entry_value(key, Box::new(move |prev| prev.map(|_| value)));
                if written {
                    debug!("[:UpdatePropagator:propagate] wrote snapshot for {}", hash);
                    Propagation::Written
                } else {
                    debug!("[:UpdatePropagator:propagate] entry for {} has no data, skipping", hash);
                    Propagation::Skipped
                }
            }
            Err(e) => {
                warn!("[:UpdatePropagator:propagate] snapshot for {} unavailable ({}), invalidating", hash, e);
                self.cache.invalidate(key);
                Propagation::Invalidated
            }
        }
    }
}
