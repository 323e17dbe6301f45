//! Observable connection state.
//!
//! Exactly one [`ConnectionState`] is the source of truth at any time. It
//! is owned and mutated by the connection supervisor; everything else reads
//! snapshots.

use serde::{Deserialize, Serialize};

/// Lifecycle status of the logical connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConnectionStatus {
    /// First open attempt is in flight.
    #[default]
    Connecting,
    /// The transport is open and writable.
    Connected,
    /// A retry is scheduled after an abnormal close or open failure.
    Reconnecting,
    /// Deliberate shutdown; terminal until a manual reconnect.
    Disconnected,
    /// Retry ceiling exceeded; terminal until a manual reconnect.
    Failed,
}

impl ConnectionStatus {
    /// Whether the status is terminal (no automatic retry will fire).
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Disconnected | Self::Failed)
    }

    /// Wire/display name, matching the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the logical connection.
///
/// Invariants:
/// - `attempts` resets to 0 only on a successful open or a manual
///   reconnect request.
/// - `attempts` increments exactly once per failed cycle, when the
///   scheduled retry fires.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionState {
    /// Current lifecycle status.
    pub status: ConnectionStatus,
    /// Consecutive failures since the last successful open or manual reset.
    pub attempts: u32,
    /// Most recent recorded error, if any.
    pub last_error: Option<String>,
}

impl ConnectionState {
    /// Record a successful open: `Connected`, counters and error cleared.
    pub fn opened(&mut self) {
        self.status = ConnectionStatus::Connected;
        self.attempts = 0;
        self.last_error = None;
    }

    /// Record a manual reconnect request: counters and error cleared,
    /// back to `Connecting`.
    pub fn manual_reset(&mut self) {
        self.status = ConnectionStatus::Connecting;
        self.attempts = 0;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state() {
        let state = ConnectionState::default();
        assert_eq!(state.status, ConnectionStatus::Connecting);
        assert_eq!(state.attempts, 0);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn opened_resets_counters() {
        let mut state = ConnectionState {
            status: ConnectionStatus::Reconnecting,
            attempts: 3,
            last_error: Some("connection refused".into()),
        };
        state.opened();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.attempts, 0);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn manual_reset_from_failed() {
        let mut state = ConnectionState {
            status: ConnectionStatus::Failed,
            attempts: 5,
            last_error: Some("retries exhausted".into()),
        };
        state.manual_reset();
        assert_eq!(state.status, ConnectionStatus::Connecting);
        assert_eq!(state.attempts, 0);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn terminal_statuses() {
        assert!(ConnectionStatus::Disconnected.is_terminal());
        assert!(ConnectionStatus::Failed.is_terminal());
        assert!(!ConnectionStatus::Connecting.is_terminal());
        assert!(!ConnectionStatus::Connected.is_terminal());
        assert!(!ConnectionStatus::Reconnecting.is_terminal());
    }

    #[test]
    fn status_serializes_camel_case() {
        let json = serde_json::to_string(&ConnectionStatus::Reconnecting).unwrap();
        assert_eq!(json, r#""reconnecting""#);
    }

    #[test]
    fn state_serde_roundtrip() {
        let state = ConnectionState {
            status: ConnectionStatus::Failed,
            attempts: 5,
            last_error: Some("gone".into()),
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: ConnectionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
