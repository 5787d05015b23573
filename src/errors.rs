//! Bridge Error Hierarchy
//!
//! Errors are split by who is at fault: connection lifecycle misuse by the
//! caller, desynchronization between the bridge and the cache bookkeeping,
//! transient snapshot unavailability, and failures of the remote query itself.

use config::ConfigError;

use crate::QueryKeyHash;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection lifecycle misuse
    #[error(transparent)]
    Bridge(#[from] BridgeError),

    /// Registry and cache bookkeeping disagree; a bridge bug, never user input
    #[error(transparent)]
    Consistency(#[from] ConsistencyError),

    /// A watch could not produce a local value
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// One-shot remote query failed; handed to the cache's retry policy as-is
    #[error(transparent)]
    RemoteQuery(#[from] RemoteQueryError),

    /// Configuration source could not be read or deserialized
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Configuration loaded but failed validation
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BridgeError {
    /// `connect` called while an event-stream subscription is still active
    #[error("Bridge is already connected to a query cache")]
    AlreadyConnected,

    /// Operation needs a bound query cache
    #[error("Bridge is not connected to a query cache")]
    NotConnected,

    /// Diagnostic listener cap reached
    #[error("Diagnostic listener limit of {max} reached")]
    TooManyListeners { max: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConsistencyError {
    /// No open subscription for a hash the cache believes is live
    #[error("Internal bridge error: {operation} called for unknown subscription {hash}")]
    UnknownSubscription {
        hash: QueryKeyHash,
        operation: &'static str,
    },

    /// A reactive-only path received an opaque key
    #[error("Internal bridge error: key {hash} is not a reactive query key")]
    NotReactive { hash: QueryKeyHash },
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    /// The watch has no locally available result yet
    #[error("No local result available for {function}")]
    NotReady { function: String },

    /// The local result exists but could not be decoded
    #[error("Failed to decode local result: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("Remote query {function} failed: {message}")]
pub struct RemoteQueryError {
    pub function: String,
    pub message: String,
}

impl RemoteQueryError {
    pub fn new(
        function: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            function: function.into(),
            message: message.into(),
        }
    }
}
