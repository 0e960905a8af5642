//! Streaming supervision

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A cycle counted countdown used to detect streaming stalls.
///
/// The timeout is armed with a budget of cycles whenever the state machine
/// starts waiting on the devices, and serviced exactly once per control
/// cycle. When the budget runs out the timeout fires exactly once and then
/// disarms itself, so re-arming is required for every wait.
///
/// A negative internal count means the timeout is disarmed.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct LoopTimeout {
    cycles_remaining: i32,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Outcome of servicing the timeout for one cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TimeoutEvent {
    /// The timeout is disarmed, nothing to supervise
    Disarmed,

    /// Still counting down
    Counting,

    /// The budget ran out this cycle. Raised once per arm.
    Expired,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LoopTimeout {
    /// Create a new disarmed timeout.
    pub fn disarmed() -> Self {
        Self {
            cycles_remaining: -1,
        }
    }

    /// Arm (or re-arm) the timeout with the given budget of cycles.
    pub fn arm(&mut self, budget_cycles: i32) {
        self.cycles_remaining = budget_cycles;
    }

    /// Disarm the timeout without firing it.
    pub fn disarm(&mut self) {
        self.cycles_remaining = -1;
    }

    /// True if the timeout is armed and counting.
    pub fn is_armed(&self) -> bool {
        self.cycles_remaining >= 0
    }

    /// Service the timeout, to be called exactly once per control cycle.
    pub fn service(&mut self) -> TimeoutEvent {
        if self.cycles_remaining < 0 {
            TimeoutEvent::Disarmed
        }
        else if self.cycles_remaining == 0 {
            // Fire once then disarm
            self.cycles_remaining = -1;
            TimeoutEvent::Expired
        }
        else {
            self.cycles_remaining -= 1;
            TimeoutEvent::Counting
        }
    }
}

impl Default for LoopTimeout {
    fn default() -> Self {
        Self::disarmed()
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_disarmed_never_fires() {
        let mut t = LoopTimeout::disarmed();

        assert!(!t.is_armed());

        for _ in 0..100 {
            assert_eq!(t.service(), TimeoutEvent::Disarmed);
        }
    }

    #[test]
    fn test_counts_down_and_fires_once() {
        let mut t = LoopTimeout::disarmed();
        t.arm(2);

        assert!(t.is_armed());
        assert_eq!(t.service(), TimeoutEvent::Counting);
        assert_eq!(t.service(), TimeoutEvent::Counting);
        assert_eq!(t.service(), TimeoutEvent::Expired);

        // After firing the timeout must disarm itself
        assert!(!t.is_armed());
        assert_eq!(t.service(), TimeoutEvent::Disarmed);
    }

    #[test]
    fn test_zero_budget_fires_immediately() {
        let mut t = LoopTimeout::disarmed();
        t.arm(0);

        assert_eq!(t.service(), TimeoutEvent::Expired);
        assert_eq!(t.service(), TimeoutEvent::Disarmed);
    }

    #[test]
    fn test_rearm_before_expiry_refreshes_budget() {
        let mut t = LoopTimeout::disarmed();
        t.arm(2);

        assert_eq!(t.service(), TimeoutEvent::Counting);
        t.arm(2);

        // Full budget again, no expiry on the next two services
        assert_eq!(t.service(), TimeoutEvent::Counting);
        assert_eq!(t.service(), TimeoutEvent::Counting);
        assert_eq!(t.service(), TimeoutEvent::Expired);
    }

    #[test]
    fn test_rearm_after_expiry() {
        let mut t = LoopTimeout::disarmed();
        t.arm(0);

        assert_eq!(t.service(), TimeoutEvent::Expired);

        t.arm(1);
        assert_eq!(t.service(), TimeoutEvent::Counting);
        assert_eq!(t.service(), TimeoutEvent::Expired);
    }

    #[test]
    fn test_disarm_suppresses_expiry() {
        let mut t = LoopTimeout::disarmed();
        t.arm(1);

        assert_eq!(t.service(), TimeoutEvent::Counting);
        t.disarm();
        assert_eq!(t.service(), TimeoutEvent::Disarmed);
    }
}
