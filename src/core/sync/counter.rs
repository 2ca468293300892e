/*!
 * Waiter Counter
 *
 * Lock-free count of threads blocked in a condition variable.
 *
 * The count is touched outside the caller's critical section (a woken waiter
 * decrements before or after re-locking), so it is a plain atomic rather than
 * lock-protected state. Underflow and overflow are detected from the value
 * returned by the RMW and raised as protocol violations instead of wrapping.
 */

use crate::core::errors::ProtocolViolation;
use crate::core::limits::MAX_WAITERS;
use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic waiter counter with violation detection
#[derive(Debug, Default)]
pub struct WaiterCounter {
    count: AtomicU64,
}

impl WaiterCounter {
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Register a waiter for the lifetime of the returned guard
    #[inline]
    pub fn enter(&self) -> WaiterGuard<'_> {
        self.add();
        WaiterGuard { counter: self }
    }

    /// Raw increment
    ///
    /// # Panics
    ///
    /// If the counter is already at `MAX_WAITERS`.
    #[inline]
    pub fn add(&self) {
        let prev = self.count.fetch_add(1, Ordering::AcqRel);
        if prev == MAX_WAITERS {
            ProtocolViolation::WaiterOverflow { max: MAX_WAITERS }.raise();
        }
    }

    /// Raw decrement
    ///
    /// # Panics
    ///
    /// If there is no matching `add`.
    #[inline]
    pub fn remove(&self) {
        let prev = self.count.fetch_sub(1, Ordering::AcqRel);
        if prev == 0 {
            ProtocolViolation::WaiterUnderflow.raise();
        }
    }

    /// Snapshot of the current count (diagnostics only)
    #[inline]
    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }

    #[inline]
    pub fn has_waiters(&self) -> bool {
        self.count() > 0
    }
}

/// RAII registration returned by `WaiterCounter::enter`
///
/// Decrements on drop, including during unwinding.
#[must_use = "dropping the guard immediately unregisters the waiter"]
#[derive(Debug)]
pub struct WaiterGuard<'a> {
    counter: &'a WaiterCounter,
}

impl Drop for WaiterGuard<'_> {
    fn drop(&mut self) {
        self.counter.remove();
    }
}
