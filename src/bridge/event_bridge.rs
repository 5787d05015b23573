use std::sync::Arc;

use tracing::debug;
use tracing::info;

use super::BridgeEvent;
use super::DiagnosticsEmitter;
use crate::CacheEvent;
use crate::CacheEventKind;
use crate::Result;
use crate::SubscriptionRegistry;

/// Mirrors the cache's `added`/`removed` edges into subscribe/unsubscribe
/// edges on the push side.
///
/// Reference counting and the eviction grace period stay with the cache;
/// every other event kind is informational.
pub struct CacheEventBridge {
    registry: Arc<SubscriptionRegistry>,
    diagnostics: Arc<DiagnosticsEmitter>,
    log_observer_events: bool,
}

impl CacheEventBridge {
    pub fn new(
        registry: Arc<SubscriptionRegistry>,
        diagnostics: Arc<DiagnosticsEmitter>,
        log_observer_events: bool,
    ) -> Self {
        Self {
            registry,
            diagnostics,
            log_observer_events,
        }
    }

    /// Handle one cache event. Opaque keys are ignored.
    ///
    /// # Errors
    /// [`crate::ConsistencyError::UnknownSubscription`] when `removed` arrives
    /// for a hash that was never opened.
    pub fn handle(
        &self,
        event: &CacheEvent,
    ) -> Result<()> {
        if !event.query_key.is_reactive() {
            return Ok(());
        }
        let hash = &event.query_hash;

        match &event.kind {
            // GC'd: no stale value will be served, so stop holding the query.
            CacheEventKind::Removed => {
                info!("[:CacheEventBridge:handle] unsubscribing from {}", hash);
                self.registry.close(hash)?;
                self.diagnostics
                    .emit(&BridgeEvent::Unsubscribed { hash: hash.clone() });
            }
            // First reference: subscribe so the value is held live.
            CacheEventKind::Added => {
                info!("[:CacheEventBridge:handle] subscribing to {}", hash);
                let outcome = self.registry.open(hash.clone(), event.query_key.clone())?;
                if outcome.is_new() {
                    self.diagnostics
                        .emit(&BridgeEvent::Subscribed { hash: hash.clone() });
                }
            }
            CacheEventKind::ObserverRemoved => {
                if event.observers_count == 0 {
                    info!(
                        "[:CacheEventBridge:handle] last observer of {} detached, unsubscribing in {:?}",
                        hash, event.gc_time
                    );
                    self.diagnostics.emit(&BridgeEvent::LastObserverRemoved {
                        hash: hash.clone(),
                        gc_time: event.gc_time,
                    });
                } else {
                    self.trace(event);
                }
            }
            CacheEventKind::Updated { action } => {
                if self.log_observer_events {
                    debug!("[:CacheEventBridge:handle] {} updated by action {}", hash, action);
                }
            }
            CacheEventKind::ObserverOptionsUpdated => {
                if self.log_observer_events {
                    debug!(
                        "[:CacheEventBridge:handle] observer options updated for {}, likely an unmemoized key",
                        hash
                    );
                }
            }
            CacheEventKind::ObserverAdded | CacheEventKind::ObserverResultsUpdated => self.trace(event),
        }

        Ok(())
    }

    fn trace(
        &self,
        event: &CacheEvent,
    ) {
        if self.log_observer_events {
            debug!(
                "[:CacheEventBridge:handle] {} for {} ({} observers)",
                event.kind, event.query_hash, event.observers_count
            );
        }
    }
}
