//! Heartbeat probe timing.
//!
//! The ticker lives only inside the connected session loop, so it is
//! active exactly while status is `Connected`: leaving the loop drops the
//! ticker, which is how the interval is "cleared". A pong only confirms
//! liveness for observability; it does not arm a watchdog.

use std::time::Duration;

use agrolink_core::ClientCommand;
use tokio::time::{self, Interval, MissedTickBehavior};

/// Interval wrapper for liveness probes.
#[derive(Debug)]
pub struct HeartbeatTicker {
    interval: Interval,
}

impl HeartbeatTicker {
    /// Create a ticker that fires every `period`, skipping (not bursting)
    /// ticks missed while the session loop was busy. The immediate first
    /// tick tokio intervals deliver is swallowed so the first probe goes
    /// out one full period after connect.
    pub fn new(period: Duration) -> Self {
        let mut interval = time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.reset(); // swallow the immediate first tick
        Self { interval }
    }

    /// Wait for the next probe deadline.
    pub async fn tick(&mut self) {
        let _ = self.interval.tick().await;
    }

    /// The probe frame to write at each tick.
    pub fn probe_frame() -> String {
        // Ping has no payload; encoding cannot fail.
        ClientCommand::Ping
            .encode()
            .unwrap_or_else(|_| r#"{"type":"ping"}"#.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_frame_is_ping() {
        assert_eq!(HeartbeatTicker::probe_frame(), r#"{"type":"ping"}"#);
    }

    #[tokio::test(start_paused = true)]
    async fn first_probe_after_one_full_period() {
        let mut ticker = HeartbeatTicker::new(Duration::from_secs(30));

        // Nothing fires before the period elapses.
        let early = tokio::time::timeout(Duration::from_secs(29), ticker.tick()).await;
        assert!(early.is_err());

        // The probe deadline arrives at the 30s mark.
        let on_time = tokio::time::timeout(Duration::from_secs(2), ticker.tick()).await;
        assert!(on_time.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_repeat_every_period() {
        let mut ticker = HeartbeatTicker::new(Duration::from_secs(30));
        for _ in 0..3 {
            let fired = tokio::time::timeout(Duration::from_secs(31), ticker.tick()).await;
            assert!(fired.is_ok());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ticker_stops_probing() {
        let ticker = HeartbeatTicker::new(Duration::from_secs(30));
        drop(ticker);
        // No task remains to fire; advancing time must not panic or hang.
        tokio::time::advance(Duration::from_secs(120)).await;
    }
}
