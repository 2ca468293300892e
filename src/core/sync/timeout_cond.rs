/*!
 * Timeout Condition Variable
 *
 * Condition variable bound to a caller-owned mutex, with bounded waits that
 * report the unused time and an interrupt that retires every current waiter.
 *
 * # Design: Replaceable Generations
 *
 * Waiters block on the current `Generation`, held in an `ArcSwap`. `signal`
 * posts to it; `interrupt` closes it and swaps in a fresh one. Both the load
 * in `wait` and the swap in `interrupt` happen under the caller's lock, so a
 * waiter is always registered against exactly one generation before the lock
 * is released, and threads that start waiting after an interrupt never see
 * the closed one.
 *
 * The waiter counter lives outside the lock: a woken thread decrements it
 * without having to take the lock again.
 */

use super::config::CondConfig;
use super::counter::{WaiterCounter, WaiterGuard};
use super::generation::{Generation, Ticket};
use super::types::{TimedWait, WakeResult, Wakeup};
use crate::core::errors::ProtocolViolation;
use arc_swap::ArcSwap;
use parking_lot::lock_api::{Mutex, MutexGuard, RawMutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, trace};

/// Result type for the predicate wait helpers
pub type WaitResult<T> = Result<T, WaitError>;

/// Why a predicate wait gave up before its condition cleared
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitError {
    #[error("Wait operation timed out")]
    Timeout,

    #[error("Wait was interrupted")]
    Interrupted,
}

/// Condition variable with timed waits and interrupt
///
/// Bound for its whole lifetime to one `Arc<Mutex<R, T>>`. Wait calls take the
/// caller's guard for that mutex, unlock it while blocked and lock it again
/// before returning.
///
/// Spurious wakeups are allowed by contract: re-check the guarded condition
/// after every return, or use [`wait_while`](Self::wait_while).
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use std::time::Duration;
/// use parking_lot::Mutex;
/// use timeout_cond::TimeoutCond;
///
/// let cond = Arc::new(TimeoutCond::new(Arc::new(Mutex::new(false))));
///
/// let waiter = {
///     let cond = cond.clone();
///     thread::spawn(move || {
///         let mut ready = cond.mutex().lock();
///         while !*ready {
///             let result = cond.wait_timeout(&mut ready, Duration::from_secs(5));
///             if result.interrupted() || result.is_timed_out() {
///                 break;
///             }
///         }
///         *ready
///     })
/// };
///
/// {
///     let mut ready = cond.mutex().lock();
///     *ready = true;
///     cond.signal();
/// }
/// assert!(waiter.join().unwrap());
/// ```
pub struct TimeoutCond<T, R = parking_lot::RawMutex>
where
    R: RawMutex,
{
    lock: Arc<Mutex<R, T>>,
    generation: ArcSwap<Generation>,
    waiters: WaiterCounter,
    config: CondConfig,
}

impl<T, R> TimeoutCond<T, R>
where
    R: RawMutex,
{
    /// Bind a new condition variable to `lock`
    pub fn new(lock: Arc<Mutex<R, T>>) -> Self {
        Self::with_config(lock, CondConfig::default())
    }

    pub fn with_config(lock: Arc<Mutex<R, T>>, config: CondConfig) -> Self {
        Self {
            lock,
            generation: ArcSwap::from_pointee(Generation::new(0)),
            waiters: WaiterCounter::new(),
            config,
        }
    }

    /// The mutex this condition variable is bound to
    #[inline]
    pub fn mutex(&self) -> &Arc<Mutex<R, T>> {
        &self.lock
    }

    #[inline]
    pub fn config(&self) -> &CondConfig {
        &self.config
    }

    /// Block until signaled or interrupted
    ///
    /// Returns `true` if woken by `interrupt`, `false` if by `signal`.
    ///
    /// # Panics
    ///
    /// If `guard` belongs to a different mutex.
    pub fn wait(&self, guard: &mut MutexGuard<'_, R, T>) -> bool {
        let (_waiter, ticket) = self.register(guard);
        let stall_after = self.config.stall_period();
        let label = self.config.label;

        let wakeup = MutexGuard::unlocked(guard, || ticket.wait_until(None, stall_after, label));
        trace!(cond = label, ?wakeup, "Wait returned");
        wakeup.is_interrupted()
    }

    /// Block until signaled, interrupted, or `timeout` elapses
    ///
    /// On a wakeup, `remaining` is `timeout` minus the time spent blocked
    /// (clamped at zero). On timeout the result is `(0, false)`.
    ///
    /// # Panics
    ///
    /// If `guard` belongs to a different mutex.
    pub fn wait_timeout(&self, guard: &mut MutexGuard<'_, R, T>, timeout: Duration) -> TimedWait {
        let (_waiter, ticket) = self.register(guard);
        let label = self.config.label;

        let result = MutexGuard::unlocked(guard, || {
            let begin = Instant::now();
            // A deadline past Instant's range means "never"
            let deadline = begin.checked_add(timeout);
            match ticket.wait_until(deadline, None, label) {
                Wakeup::TimedOut => TimedWait::timed_out(),
                wakeup => TimedWait::woken(timeout, begin.elapsed(), wakeup),
            }
        });
        trace!(
            cond = label,
            wakeup = ?result.wakeup(),
            remaining_us = result.remaining().as_micros() as u64,
            "Timed wait returned"
        );
        result
    }

    /// Wait while `condition` holds
    ///
    /// `condition` is checked before the first wait and after every wakeup.
    /// Returns `Err(WaitError::Interrupted)` if a wait is interrupted first.
    pub fn wait_while<F>(&self, guard: &mut MutexGuard<'_, R, T>, mut condition: F) -> WaitResult<()>
    where
        F: FnMut(&mut T) -> bool,
    {
        while condition(&mut **guard) {
            if self.wait(guard) {
                return Err(WaitError::Interrupted);
            }
        }
        Ok(())
    }

    /// Wait while `condition` holds, for at most `timeout` in total
    ///
    /// Returns the unused budget once the condition clears. The condition is
    /// checked one last time after the budget runs out.
    pub fn wait_timeout_while<F>(
        &self,
        guard: &mut MutexGuard<'_, R, T>,
        timeout: Duration,
        mut condition: F,
    ) -> WaitResult<Duration>
    where
        F: FnMut(&mut T) -> bool,
    {
        let mut remaining = timeout;

        loop {
            if !condition(&mut **guard) {
                return Ok(remaining);
            }
            if remaining.is_zero() {
                return Err(WaitError::Timeout);
            }

            let result = self.wait_timeout(guard, remaining);
            if result.interrupted() {
                return Err(WaitError::Interrupted);
            }
            remaining = result.remaining();
        }
    }

    /// Wake one waiter of the current generation, if any
    ///
    /// A signal nobody is registered to receive is dropped. The returned
    /// `WakeResult` is diagnostic only.
    pub fn signal(&self) -> WakeResult {
        let result = self.generation.load().post_one();
        trace!(cond = self.config.label, ?result, "Signal");
        result
    }

    /// Wake and retire every current waiter
    ///
    /// Takes the lock internally. Use [`interrupt_locked`](Self::interrupt_locked)
    /// when already holding it.
    pub fn interrupt(&self) -> WakeResult {
        let mut guard = self.lock.lock();
        self.interrupt_locked(&mut guard)
    }

    /// `interrupt` for a caller that already holds the lock
    ///
    /// # Panics
    ///
    /// If `guard` belongs to a different mutex.
    pub fn interrupt_locked(&self, guard: &mut MutexGuard<'_, R, T>) -> WakeResult {
        self.assert_bound(guard);

        let current = self.generation.load_full();
        let result = current.close_all();
        debug_assert!(current.is_closed());
        self.generation
            .store(Arc::new(Generation::new(current.epoch() + 1)));

        debug!(
            cond = self.config.label,
            epoch = current.epoch(),
            woken = result.count(),
            "Interrupted waiters"
        );
        result
    }

    /// Whether any thread is blocked in a wait call (snapshot)
    #[inline]
    pub fn has_waiters(&self) -> bool {
        self.waiters.has_waiters()
    }

    /// Number of threads blocked in a wait call (snapshot)
    #[inline]
    pub fn waiter_count(&self) -> u64 {
        self.waiters.count()
    }

    /// Number of interrupts so far
    #[inline]
    pub fn epoch(&self) -> u64 {
        self.generation.load().epoch()
    }

    /// Count the waiter and register it on the current generation
    ///
    /// Must run before the lock is released.
    fn register(&self, guard: &MutexGuard<'_, R, T>) -> (WaiterGuard<'_>, Ticket) {
        self.assert_bound(guard);
        let ticket = Ticket::new(self.generation.load_full());
        let waiter = self.waiters.enter();
        trace!(cond = self.config.label, epoch = ticket.epoch(), "Waiter registered");
        (waiter, ticket)
    }

    #[inline]
    fn assert_bound(&self, guard: &MutexGuard<'_, R, T>) {
        if !std::ptr::eq(MutexGuard::mutex(guard), Arc::as_ptr(&self.lock)) {
            ProtocolViolation::ForeignLock.raise();
        }
    }
}

impl<T, R> std::fmt::Debug for TimeoutCond<T, R>
where
    R: RawMutex,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeoutCond")
            .field("label", &self.config.label)
            .field("epoch", &self.epoch())
            .field("waiters", &self.waiters.count())
            .finish()
    }
}
