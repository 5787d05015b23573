use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::canonical_json;
use crate::canonicalize;
use crate::FunctionReference;
use crate::ReactiveClient;
use crate::RemoteQueryError;
use crate::SnapshotError;
use crate::Unsubscribe;
use crate::UpdateCallback;
use crate::Watch;

type Listener = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct PushState {
    snapshots: HashMap<String, Result<Value, SnapshotError>>,
    listeners: HashMap<String, Vec<(u64, Listener)>>,
    next_listener: u64,
    watches_created: usize,
    query_results: HashMap<String, Result<Value, RemoteQueryError>>,
    query_calls: Vec<(String, Value)>,
    leak_detach: bool,
}

/// Scriptable push client.
///
/// Watches with the same function and canonical args share one local result
/// and one listener list.
#[derive(Clone, Default)]
pub struct MockPushClient {
    state: Arc<Mutex<PushState>>,
}

fn watch_id(
    function: &FunctionReference,
    args: &Value,
) -> String {
    format!("{}-{}", function.name(), canonical_json(&canonicalize(args)))
}

impl MockPushClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Server pushed `value`: store it locally and notify every listener.
    pub fn push(
        &self,
        function: &FunctionReference,
        args: &Value,
        value: Value,
    ) {
        let id = watch_id(function, args);
        self.state.lock().snapshots.insert(id.clone(), Ok(value));
        self.notify_id(&id);
    }

    /// Make the local result unreadable and notify every listener.
    pub fn fail_snapshot(
        &self,
        function: &FunctionReference,
        args: &Value,
        error: SnapshotError,
    ) {
        let id = watch_id(function, args);
        self.state.lock().snapshots.insert(id.clone(), Err(error));
        self.notify_id(&id);
    }

    /// Fire listeners without changing the local result.
    pub fn notify(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) {
        self.notify_id(&watch_id(function, args));
    }

    /// Script the outcome of the one-shot query for `function(args)`.
    pub fn set_query_result(
        &self,
        function: &FunctionReference,
        args: &Value,
        result: Result<Value, RemoteQueryError>,
    ) {
        self.state.lock().query_results.insert(watch_id(function, args), result);
    }

    /// Unsubscribe closures stop detaching, as if a notification was already
    /// queued when the watch was closed.
    pub fn leak_detach(
        &self,
        leak: bool,
    ) {
        self.state.lock().leak_detach = leak;
    }

    pub fn listener_count(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> usize {
        let id = watch_id(function, args);
        self.state.lock().listeners.get(&id).map(|l| l.len()).unwrap_or(0)
    }

    pub fn total_listeners(&self) -> usize {
        self.state.lock().listeners.values().map(|l| l.len()).sum()
    }

    pub fn watches_created(&self) -> usize {
        self.state.lock().watches_created
    }

    pub fn query_calls(&self) -> Vec<(String, Value)> {
        self.state.lock().query_calls.clone()
    }

    fn notify_id(
        &self,
        id: &str,
    ) {
        let snapshot: Vec<Listener> = {
            let state = self.state.lock();
            state
                .listeners
                .get(id)
                .map(|l| l.iter().map(|(_, cb)| Arc::clone(cb)).collect())
                .unwrap_or_default()
        };
        for cb in snapshot {
            cb();
        }
    }
}

pub struct MockPushWatch {
    id: String,
    function: String,
    state: Arc<Mutex<PushState>>,
}

impl Watch for MockPushWatch {
    fn local_query_result(&self) -> Result<Value, SnapshotError> {
        self.state
            .lock()
            .snapshots
            .get(&self.id)
            .cloned()
            .unwrap_or_else(|| {
                Err(SnapshotError::NotReady {
                    function: self.function.clone(),
                })
            })
    }

    fn on_update(
        &self,
        callback: UpdateCallback,
    ) -> Unsubscribe {
        let listener_id = {
            let mut state = self.state.lock();
            state.next_listener += 1;
            let listener_id = state.next_listener;
            state
                .listeners
                .entry(self.id.clone())
                .or_default()
                .push((listener_id, Arc::from(callback)));
            listener_id
        };

        let state = Arc::clone(&self.state);
        let id = self.id.clone();
        Box::new(move || {
            let mut state = state.lock();
            if state.leak_detach {
                return;
            }
            if let Some(listeners) = state.listeners.get_mut(&id) {
                listeners.retain(|(lid, _)| *lid != listener_id);
                if listeners.is_empty() {
                    state.listeners.remove(&id);
                }
            }
        })
    }
}

#[async_trait]
impl ReactiveClient for MockPushClient {
    fn watch_query(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> Box<dyn Watch> {
        self.state.lock().watches_created += 1;
        Box::new(MockPushWatch {
            id: watch_id(function, args),
            function: function.name().to_string(),
            state: Arc::clone(&self.state),
        })
    }

    async fn query(
        &self,
        function: &FunctionReference,
        args: &Value,
    ) -> Result<Value, RemoteQueryError> {
        let mut state = self.state.lock();
        state.query_calls.push((function.name().to_string(), args.clone()));
        state
            .query_results
            .get(&watch_id(function, args))
            .cloned()
            .unwrap_or_else(|| Err(RemoteQueryError::new(function.name(), "no result scripted")))
    }
}
