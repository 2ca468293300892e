/*!
 * Wake and Wait Outcomes
 *
 * Small value types returned by the condition variable. None of them are
 * errors: timeouts, interrupts and dropped signals are all normal results.
 */

use std::time::Duration;

/// Result of a wake operation
///
/// Point-in-time diagnostic. Waiters may time out concurrently, so `Woken(n)`
/// counts the waiters registered when the wake was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeResult {
    /// Woke (or handed a permit to) N waiters (N >= 1)
    Woken(usize),
    /// Nobody was waiting; the wake was dropped
    NoWaiters,
}

impl WakeResult {
    #[inline]
    pub(crate) fn from_count(count: usize) -> Self {
        if count == 0 {
            WakeResult::NoWaiters
        } else {
            WakeResult::Woken(count)
        }
    }

    /// Check if any waiters were woken
    #[inline(always)]
    pub fn is_woken(&self) -> bool {
        matches!(self, WakeResult::Woken(_))
    }

    /// Get number of woken waiters (0 if none)
    #[inline(always)]
    pub fn count(&self) -> usize {
        match self {
            WakeResult::Woken(n) => *n,
            WakeResult::NoWaiters => 0,
        }
    }
}

/// Why a blocked waiter returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// Woken by `signal`
    Signaled,
    /// Woken because the generation was closed by `interrupt`
    Interrupted,
    /// The deadline passed first
    TimedOut,
}

impl Wakeup {
    #[inline]
    pub fn is_interrupted(self) -> bool {
        self == Wakeup::Interrupted
    }
}

/// Outcome of `TimeoutCond::wait_timeout`
///
/// `remaining` is the unused part of the timeout, clamped at zero. A signal
/// that races the deadline can report `Signaled` with zero remaining; treat
/// zero as "no time left" either way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedWait {
    remaining: Duration,
    wakeup: Wakeup,
}

impl TimedWait {
    #[inline]
    pub(crate) fn woken(timeout: Duration, elapsed: Duration, wakeup: Wakeup) -> Self {
        Self {
            remaining: timeout.saturating_sub(elapsed),
            wakeup,
        }
    }

    #[inline]
    pub(crate) fn timed_out() -> Self {
        Self {
            remaining: Duration::ZERO,
            wakeup: Wakeup::TimedOut,
        }
    }

    #[inline]
    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    /// True only when woken by `interrupt`
    #[inline]
    pub fn interrupted(&self) -> bool {
        self.wakeup.is_interrupted()
    }

    /// True when the deadline elapsed before any wake
    #[inline]
    pub fn is_timed_out(&self) -> bool {
        self.wakeup == Wakeup::TimedOut
    }

    #[inline]
    pub fn wakeup(&self) -> Wakeup {
        self.wakeup
    }

    /// `(remaining, interrupted)`
    #[inline]
    pub fn into_parts(self) -> (Duration, bool) {
        (self.remaining, self.interrupted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wake_result_from_count() {
        assert_eq!(WakeResult::from_count(0), WakeResult::NoWaiters);
        assert_eq!(WakeResult::from_count(3), WakeResult::Woken(3));
        assert_eq!(WakeResult::Woken(3).count(), 3);
        assert!(!WakeResult::NoWaiters.is_woken());
    }

    #[test]
    fn test_timed_out_parts() {
        let result = TimedWait::timed_out();
        assert!(result.is_timed_out());
        assert_eq!(result.into_parts(), (Duration::ZERO, false));
    }

    #[test]
    fn test_remaining_clamps_at_zero() {
        let result = TimedWait::woken(
            Duration::from_millis(10),
            Duration::from_millis(11),
            Wakeup::Signaled,
        );
        assert_eq!(result.remaining(), Duration::ZERO);
        assert!(!result.interrupted());
        assert!(!result.is_timed_out());
    }

    #[test]
    fn test_interrupted_keeps_remaining() {
        let result = TimedWait::woken(
            Duration::from_millis(100),
            Duration::from_millis(30),
            Wakeup::Interrupted,
        );
        assert_eq!(result.into_parts(), (Duration::from_millis(70), true));
    }
}
