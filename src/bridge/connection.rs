use std::sync::Arc;
use std::sync::Weak;

use parking_lot::Mutex;
use tracing::debug;
use tracing::error;
use tracing::info;

use super::BridgeEvent;
use super::CacheEventBridge;
use super::DiagnosticsEmitter;
use crate::BridgeConfig;
use crate::Propagation;
use crate::QueryCache;
use crate::QueryKeyHash;
use crate::ReactiveClient;
use crate::Result;
use crate::SubscriptionId;
use crate::SubscriptionRegistry;
use crate::Unsubscribe;
use crate::UpdateNotifier;
use crate::UpdatePropagator;

/// Binding of one registry and event bridge to exactly one cache
pub(crate) struct BridgeConnection {
    cache: Arc<dyn QueryCache>,
    registry: Arc<SubscriptionRegistry>,
    propagator: UpdatePropagator,
    events: CacheEventBridge,
    diagnostics: Arc<DiagnosticsEmitter>,
    unsubscribe: Mutex<Option<Unsubscribe>>,
}

impl BridgeConnection {
    /// Build the connection without listening to the cache yet; see
    /// [`BridgeConnection::attach`].
    pub(crate) fn new(
        cache: Arc<dyn QueryCache>,
        client: Arc<dyn ReactiveClient>,
        diagnostics: Arc<DiagnosticsEmitter>,
        config: &BridgeConfig,
    ) -> Arc<Self> {
        Arc::new_cyclic(|weak: &Weak<BridgeConnection>| {
            let weak = weak.clone();
            let notifier: UpdateNotifier = Arc::new(move |hash: &QueryKeyHash, id: SubscriptionId| {
                if let Some(connection) = weak.upgrade() {
                    connection.on_watch_update(hash, id);
                }
            });

            let registry = Arc::new(SubscriptionRegistry::new(
                client,
                notifier,
                config.registry.initial_capacity,
            ));

            BridgeConnection {
                propagator: UpdatePropagator::new(Arc::clone(&cache), Arc::clone(&registry)),
                events: CacheEventBridge::new(
                    Arc::clone(&registry),
                    Arc::clone(&diagnostics),
                    config.diagnostics.log_observer_events,
                ),
                cache,
                registry,
                diagnostics,
                unsubscribe: Mutex::new(None),
            }
        })
    }

    /// Start listening to the cache's event stream.
    pub(crate) fn attach(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        let unsubscribe = self.cache.subscribe(Box::new(move |event| {
            let Some(connection) = weak.upgrade() else {
                return;
            };
            if let Err(e) = connection.events.handle(event) {
                error!(
                    "[:BridgeConnection:listener] {} event for {} failed: {}",
                    event.kind, event.query_hash, e
                );
            }
        }));
        *self.unsubscribe.lock() = Some(unsubscribe);
        info!("[:BridgeConnection:attach] listening to query cache events");
    }

    /// Stop listening and close every open subscription.
    pub(crate) fn detach(&self) -> Vec<QueryKeyHash> {
        let unsubscribe = self.unsubscribe.lock().take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }

        let closed = self.registry.close_all();
        for hash in &closed {
            self.diagnostics
                .emit(&BridgeEvent::Unsubscribed { hash: hash.clone() });
        }
        info!("[:BridgeConnection:detach] detached, closed {} subscriptions", closed.len());
        closed
    }

    pub(crate) fn cache(&self) -> &Arc<dyn QueryCache> {
        &self.cache
    }

    pub(crate) fn registry(&self) -> &Arc<SubscriptionRegistry> {
        &self.registry
    }

    pub(crate) fn events(&self) -> &CacheEventBridge {
        &self.events
    }

    /// Run the propagator for `hash` and report the outcome.
    pub(crate) fn propagate(
        &self,
        hash: &QueryKeyHash,
    ) -> Result<Propagation> {
        let propagation = self.propagator.on_update(hash)?;
        match propagation {
            Propagation::Written => self
                .diagnostics
                .emit(&BridgeEvent::Propagated { hash: hash.clone() }),
            Propagation::Invalidated => self
                .diagnostics
                .emit(&BridgeEvent::Invalidated { hash: hash.clone() }),
            Propagation::Skipped => {}
        }
        Ok(propagation)
    }

    fn on_watch_update(
        &self,
        hash: &QueryKeyHash,
        id: SubscriptionId,
    ) {
        // A callback can outlive its subscription when a notification was
        // already in flight at close time.
        if !self.registry.is_current(hash, id) {
            debug!(
                "[:BridgeConnection:on_watch_update] dropping update for closed subscription {} (id={})",
                hash, id
            );
            return;
        }

        if let Err(e) = self.propagate(hash) {
            error!("[:BridgeConnection:on_watch_update] {}", e);
        }
    }
}

impl Drop for BridgeConnection {
    fn drop(&mut self) {
        let unsubscribe = self.unsubscribe.get_mut().take();
        if let Some(unsubscribe) = unsubscribe {
            unsubscribe();
        }
    }
}
