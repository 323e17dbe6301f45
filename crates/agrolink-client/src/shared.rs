//! State shared between the supervisor, router, and gateway.

use std::sync::atomic::{AtomicBool, Ordering};

use agrolink_core::{ConnectionState, ConnectionStatus};
use parking_lot::Mutex;

/// The single authoritative connection state plus the analysis-in-progress
/// flag, shared behind `Arc`.
///
/// Status transitions are made only by the connection supervisor; the
/// router and gateway are limited to recording `last_error` and toggling
/// the analyzing flag.
#[derive(Debug, Default)]
pub struct ClientShared {
    state: Mutex<ConnectionState>,
    analyzing: AtomicBool,
}

impl ClientShared {
    /// Create shared state in the initial `Connecting` posture.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current connection state.
    pub fn snapshot(&self) -> ConnectionState {
        self.state.lock().clone()
    }

    /// Current status.
    pub fn status(&self) -> ConnectionStatus {
        self.state.lock().status
    }

    /// Consecutive failures since the last successful open or reset.
    pub fn attempts(&self) -> u32 {
        self.state.lock().attempts
    }

    /// Record a successful open.
    pub(crate) fn opened(&self) {
        self.state.lock().opened();
    }

    /// Record a manual reconnect request.
    pub(crate) fn manual_reset(&self) {
        self.state.lock().manual_reset();
    }

    /// Set the status without touching counters.
    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        self.state.lock().status = status;
    }

    /// Set the status and record the error that caused it.
    pub(crate) fn set_status_with_error(&self, status: ConnectionStatus, error: impl Into<String>) {
        let mut state = self.state.lock();
        state.status = status;
        state.last_error = Some(error.into());
    }

    /// Count one fired retry. Called exactly once per failed cycle, when
    /// the scheduled retry timer fires.
    pub(crate) fn count_retry(&self) {
        self.state.lock().attempts += 1;
    }

    /// Record an error without changing status (decode failures, backend
    /// error notices, gateway rejections).
    pub(crate) fn record_error(&self, error: impl Into<String>) {
        self.state.lock().last_error = Some(error.into());
    }

    /// Whether an analysis request is currently in flight.
    pub fn is_analyzing(&self) -> bool {
        self.analyzing.load(Ordering::Relaxed)
    }

    /// Set the analysis-in-progress flag.
    pub(crate) fn set_analyzing(&self, analyzing: bool) {
        self.analyzing.store(analyzing, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_connecting() {
        let shared = ClientShared::new();
        assert_eq!(shared.status(), ConnectionStatus::Connecting);
        assert_eq!(shared.attempts(), 0);
        assert!(!shared.is_analyzing());
    }

    #[test]
    fn opened_clears_error_and_attempts() {
        let shared = ClientShared::new();
        shared.set_status_with_error(ConnectionStatus::Reconnecting, "refused");
        shared.count_retry();
        shared.count_retry();
        assert_eq!(shared.attempts(), 2);

        shared.opened();
        let state = shared.snapshot();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.attempts, 0);
        assert!(state.last_error.is_none());
    }

    #[test]
    fn record_error_preserves_status() {
        let shared = ClientShared::new();
        shared.set_status(ConnectionStatus::Connected);
        shared.record_error("malformed frame");
        let state = shared.snapshot();
        assert_eq!(state.status, ConnectionStatus::Connected);
        assert_eq!(state.last_error.as_deref(), Some("malformed frame"));
    }

    #[test]
    fn analyzing_flag_toggles() {
        let shared = ClientShared::new();
        shared.set_analyzing(true);
        assert!(shared.is_analyzing());
        shared.set_analyzing(false);
        assert!(!shared.is_analyzing());
    }

    #[test]
    fn count_retry_is_exact() {
        let shared = ClientShared::new();
        for expected in 1..=5 {
            shared.count_retry();
            assert_eq!(shared.attempts(), expected);
        }
    }
}
