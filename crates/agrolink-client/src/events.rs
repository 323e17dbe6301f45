//! Typed events emitted by the connection manager.
//!
//! The supervisor and router never call back into the UI; they emit
//! [`ClientEvent`]s on a channel consumed by a single dispatch loop, which
//! makes ordering and cancellation explicit.

use agrolink_core::ConnectionState;
use serde_json::Value;

/// An event delivered to the front end.
#[derive(Clone, Debug, PartialEq)]
pub enum ClientEvent {
    /// The connection state changed; carries the full new snapshot.
    StatusChanged(ConnectionState),
    /// An agent delivered (or replaced) its result.
    AgentResult {
        /// Agent name.
        agent: String,
        /// The result payload as stored.
        data: Value,
    },
    /// Progress text from the backend.
    StatusText {
        /// The message as received.
        message: String,
    },
    /// The in-flight analysis finished.
    AnalysisComplete,
    /// The backend announced the scenario under analysis.
    Scenario {
        /// Scenario name and description.
        data: Value,
    },
    /// The backend reported a non-fatal error.
    BackendError {
        /// Error text.
        message: String,
    },
}
