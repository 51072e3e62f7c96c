//! Connection liveness tracking.
//!
//! The session pings the server on a fixed interval and records every pong.
//! If three probe intervals pass without a pong the connection is treated
//! as dead and force-closed by the session loop.

use std::time::{Duration, Instant};

/// How often a liveness probe is sent.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(20);

/// Probe intervals without an ack before the connection counts as dead.
pub const STALE_MULTIPLE: u32 = 3;

/// Liveness state for one connection.
#[derive(Debug)]
pub struct Heartbeat {
    probe_interval: Duration,
    timeout: Duration,
    last_ack: Instant,
}

impl Heartbeat {
    /// Track a connection considered live as of `now`.
    pub fn new(now: Instant) -> Self {
        Self::with_interval(PROBE_INTERVAL, now)
    }

    /// Track with a custom probe interval; the staleness threshold scales
    /// with it.
    pub fn with_interval(probe_interval: Duration, now: Instant) -> Self {
        Self {
            probe_interval,
            timeout: probe_interval * STALE_MULTIPLE,
            last_ack: now,
        }
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    /// Record a liveness acknowledgment from the peer.
    pub fn record_ack(&mut self, now: Instant) {
        self.last_ack = now;
    }

    /// Whether the peer has been silent past the staleness threshold.
    pub fn is_stale(&self, now: Instant) -> bool {
        now.duration_since(self.last_ack) > self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_connection_is_live() {
        let start = Instant::now();
        let hb = Heartbeat::new(start);
        assert!(!hb.is_stale(start));
        assert!(!hb.is_stale(start + PROBE_INTERVAL));
    }

    #[test]
    fn test_silence_past_threshold_is_stale() {
        let start = Instant::now();
        let hb = Heartbeat::with_interval(Duration::from_secs(20), start);

        assert!(!hb.is_stale(start + Duration::from_secs(60)));
        assert!(hb.is_stale(start + Duration::from_secs(61)));
    }

    #[test]
    fn test_ack_resets_staleness() {
        let start = Instant::now();
        let mut hb = Heartbeat::with_interval(Duration::from_secs(20), start);

        hb.record_ack(start + Duration::from_secs(59));
        assert!(!hb.is_stale(start + Duration::from_secs(100)));
        assert!(hb.is_stale(start + Duration::from_secs(120)));
    }
}
