//! Online/offline indicator maintained by the transport layer.
//!
//! Every request outcome updates it: a response of any status means the
//! engine is reachable, a transport failure means it is not.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{info, warn};

/// Point-in-time connectivity view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectivitySnapshot {
    pub online: bool,
    pub changed_at: DateTime<Utc>,
    /// Consecutive transport failures since the last response.
    pub consecutive_failures: u32,
}

/// Shared connectivity indicator.
#[derive(Debug)]
pub struct Connectivity {
    state: RwLock<ConnectivitySnapshot>,
}

impl Connectivity {
    /// Start optimistic: online until a request fails.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(ConnectivitySnapshot {
                online: true,
                changed_at: Utc::now(),
                consecutive_failures: 0,
            }),
        }
    }

    /// Record a received response. Returns true if the state flipped.
    pub fn mark_online(&self) -> bool {
        let mut state = self.state.write();
        state.consecutive_failures = 0;
        if state.online {
            return false;
        }
        state.online = true;
        state.changed_at = Utc::now();
        info!("Engine connection restored");
        true
    }

    /// Record a transport failure. Returns true if the state flipped.
    pub fn mark_offline(&self) -> bool {
        let mut state = self.state.write();
        state.consecutive_failures = state.consecutive_failures.saturating_add(1);
        if !state.online {
            return false;
        }
        state.online = false;
        state.changed_at = Utc::now();
        warn!("Engine connection lost");
        true
    }

    pub fn is_online(&self) -> bool {
        self.state.read().online
    }

    pub fn snapshot(&self) -> ConnectivitySnapshot {
        *self.state.read()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transitions_report_flips_only() {
        let conn = Connectivity::new();
        assert!(conn.is_online());
        assert!(!conn.mark_online());

        assert!(conn.mark_offline());
        assert!(!conn.mark_offline());
        assert_eq!(conn.snapshot().consecutive_failures, 2);

        assert!(conn.mark_online());
        assert!(conn.is_online());
        assert_eq!(conn.snapshot().consecutive_failures, 0);
    }
}
