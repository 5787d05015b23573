use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::QueryKey;
use crate::QueryKeyHash;
use crate::SnapshotError;
use crate::Unsubscribe;
use crate::Watch;

/// Distinguishes successive subscriptions opened for the same hash
pub type SubscriptionId = u64;

/// Registry entry owning one live [`Watch`].
///
/// The update listener is detached exactly once, either by
/// [`SubscriptionRegistry::close`](super::SubscriptionRegistry::close) or when
/// the last reference is dropped.
pub struct Subscription {
    id: SubscriptionId,
    hash: QueryKeyHash,
    query_key: QueryKey,
    watch: Arc<dyn Watch>,
    detach: Mutex<Option<Unsubscribe>>,
}

impl Subscription {
    pub(crate) fn new(
        id: SubscriptionId,
        hash: QueryKeyHash,
        query_key: QueryKey,
        watch: Arc<dyn Watch>,
        detach: Unsubscribe,
    ) -> Self {
        Self {
            id,
            hash,
            query_key,
            watch,
            detach: Mutex::new(Some(detach)),
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn hash(&self) -> &QueryKeyHash {
        &self.hash
    }

    pub fn query_key(&self) -> &QueryKey {
        &self.query_key
    }

    /// Local value of the watch, without a round trip
    pub fn snapshot(&self) -> std::result::Result<Value, SnapshotError> {
        self.watch.local_query_result()
    }

    pub fn is_attached(&self) -> bool {
        self.detach.lock().is_some()
    }

    /// Detach the update listener. Later calls are no-ops.
    pub(crate) fn release(&self) {
        // take under the lock, call outside it
        let detach = self.detach.lock().take();
        if let Some(detach) = detach {
            detach();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("hash", &self.hash)
            .field("attached", &self.is_attached())
            .finish()
    }
}
