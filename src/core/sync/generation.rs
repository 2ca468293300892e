/*!
 * Waiter Generations
 *
 * A generation is a one-shot broadcast object shared by one epoch of waiters.
 *
 * # Design
 *
 * Each generation owns a parking_lot `Mutex`/`Condvar` pair guarding three
 * counters:
 * - `registered`: waiters holding a live `Ticket`
 * - `permits`: signals handed out but not yet consumed (`permits <= registered`)
 * - `closed`: set once by `close_all`, never cleared
 *
 * Waiters register while the caller's lock is still held and only then release
 * it, so a signal that lands between the release and the park becomes a permit
 * the waiter picks up on its first check. A signal with no unpermitted waiter
 * is dropped. Once closed, every wait on the generation returns immediately;
 * the condition variable installs a fresh generation instead of reopening.
 */

use super::types::{WakeResult, Wakeup};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

#[derive(Debug, Default)]
struct GenerationState {
    registered: usize,
    permits: usize,
    closed: bool,
}

/// One epoch of waiters
#[derive(Debug)]
pub(crate) struct Generation {
    epoch: u64,
    state: Mutex<GenerationState>,
    condvar: Condvar,
}

impl Generation {
    pub(crate) fn new(epoch: u64) -> Self {
        Self {
            epoch,
            state: Mutex::new(GenerationState::default()),
            condvar: Condvar::new(),
        }
    }

    #[inline]
    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Hand one permit to a registered waiter, if any lacks one
    pub(crate) fn post_one(&self) -> WakeResult {
        let mut state = self.state.lock();
        if state.closed || state.permits >= state.registered {
            return WakeResult::NoWaiters;
        }
        state.permits += 1;
        drop(state);

        self.condvar.notify_one();
        WakeResult::Woken(1)
    }

    /// Close the generation and wake every waiter on it
    ///
    /// Idempotent; a second call reports `NoWaiters`.
    pub(crate) fn close_all(&self) -> WakeResult {
        let mut state = self.state.lock();
        if state.closed {
            return WakeResult::NoWaiters;
        }
        state.closed = true;
        let registered = state.registered;
        drop(state);

        self.condvar.notify_all();
        WakeResult::from_count(registered)
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    #[cfg(test)]
    fn registered(&self) -> usize {
        self.state.lock().registered
    }
}

/// A single waiter's registration on a generation
///
/// Created under the caller's lock; consumed by `wait_until`. Dropping an
/// unconsumed ticket withdraws the registration.
#[must_use = "a ticket does nothing unless waited on"]
#[derive(Debug)]
pub(crate) struct Ticket {
    generation: Arc<Generation>,
    settled: bool,
}

impl Ticket {
    pub(crate) fn new(generation: Arc<Generation>) -> Self {
        generation.state.lock().registered += 1;
        Self {
            generation,
            settled: false,
        }
    }

    #[inline]
    pub(crate) fn epoch(&self) -> u64 {
        self.generation.epoch
    }

    /// Block until a permit, a close, or `deadline` (never, if `None`)
    ///
    /// With `stall_after` set, a warning is logged every time that period
    /// passes without a wakeup. The waiter keeps waiting afterwards.
    pub(crate) fn wait_until(
        mut self,
        deadline: Option<Instant>,
        stall_after: Option<Duration>,
        label: &'static str,
    ) -> Wakeup {
        let generation = Arc::clone(&self.generation);
        let mut state = generation.state.lock();
        let started = Instant::now();
        let mut next_warning = stall_after.and_then(|period| started.checked_add(period));

        let wakeup = loop {
            if state.closed {
                break Wakeup::Interrupted;
            }
            if state.permits > 0 {
                state.permits -= 1;
                break Wakeup::Signaled;
            }

            let now = Instant::now();
            if deadline.is_some_and(|d| now >= d) {
                break Wakeup::TimedOut;
            }
            if let (Some(at), Some(period)) = (next_warning, stall_after) {
                if now >= at {
                    warn!(
                        cond = label,
                        epoch = generation.epoch,
                        blocked_ms = now.duration_since(started).as_millis() as u64,
                        "Waiter stalled without signal or interrupt"
                    );
                    next_warning = now.checked_add(period);
                }
            }

            let wake_at = match (deadline, next_warning) {
                (Some(d), Some(w)) => Some(d.min(w)),
                (d, w) => d.or(w),
            };
            match wake_at {
                Some(at) => {
                    generation.condvar.wait_until(&mut state, at);
                }
                None => generation.condvar.wait(&mut state),
            }
        };

        state.registered -= 1;
        self.settled = true;
        wakeup
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        if !self.settled {
            self.generation.state.lock().registered -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn park(generation: &Arc<Generation>, timeout: Option<Duration>) -> thread::JoinHandle<Wakeup> {
        let ticket = Ticket::new(Arc::clone(generation));
        thread::spawn(move || {
            let deadline = timeout.map(|t| Instant::now() + t);
            ticket.wait_until(deadline, None, "test")
        })
    }

    #[test]
    fn test_post_without_waiters_is_dropped() {
        let generation = Arc::new(Generation::new(0));
        assert_eq!(generation.post_one(), WakeResult::NoWaiters);

        // The dropped post must not satisfy a later waiter
        let ticket = Ticket::new(Arc::clone(&generation));
        let wakeup = ticket.wait_until(Some(Instant::now() + Duration::from_millis(20)), None, "test");
        assert_eq!(wakeup, Wakeup::TimedOut);
    }

    #[test]
    fn test_post_before_park_is_kept() {
        let generation = Arc::new(Generation::new(0));
        let ticket = Ticket::new(Arc::clone(&generation));

        assert_eq!(generation.post_one(), WakeResult::Woken(1));
        // Only one registered waiter, so a second post has nobody to go to
        assert_eq!(generation.post_one(), WakeResult::NoWaiters);

        assert_eq!(ticket.wait_until(None, None, "test"), Wakeup::Signaled);
        assert_eq!(generation.registered(), 0);
    }

    #[test]
    fn test_post_wakes_one() {
        let generation = Arc::new(Generation::new(0));
        let handles: Vec<_> = (0..2)
            .map(|_| park(&generation, Some(Duration::from_millis(300))))
            .collect();

        thread::sleep(Duration::from_millis(50));
        assert!(generation.post_one().is_woken());

        let mut outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        outcomes.sort_by_key(|w| *w as u8);
        assert_eq!(outcomes, vec![Wakeup::Signaled, Wakeup::TimedOut]);
    }

    #[test]
    fn test_close_wakes_all() {
        let generation = Arc::new(Generation::new(3));
        let handles: Vec<_> = (0..3).map(|_| park(&generation, None)).collect();

        thread::sleep(Duration::from_millis(50));
        assert_eq!(generation.close_all(), WakeResult::Woken(3));
        assert_eq!(generation.close_all(), WakeResult::NoWaiters);

        for handle in handles {
            assert_eq!(handle.join().unwrap(), Wakeup::Interrupted);
        }
        assert!(generation.is_closed());
        assert_eq!(generation.epoch(), 3);
    }

    #[test]
    fn test_closed_generation_returns_immediately() {
        let generation = Arc::new(Generation::new(0));
        generation.close_all();

        let ticket = Ticket::new(Arc::clone(&generation));
        assert_eq!(ticket.wait_until(None, None, "test"), Wakeup::Interrupted);
        assert_eq!(generation.post_one(), WakeResult::NoWaiters);
    }

    #[test]
    fn test_dropped_ticket_unregisters() {
        let generation = Arc::new(Generation::new(0));
        let ticket = Ticket::new(Arc::clone(&generation));
        assert_eq!(generation.registered(), 1);

        drop(ticket);
        assert_eq!(generation.registered(), 0);
        assert_eq!(generation.post_one(), WakeResult::NoWaiters);
    }

    #[test]
    fn test_stall_warning_keeps_waiting() {
        let generation = Arc::new(Generation::new(0));
        let ticket = Ticket::new(Arc::clone(&generation));
        let poster = Arc::clone(&generation);

        let handle = thread::spawn(move || {
            ticket.wait_until(None, Some(Duration::from_millis(5)), "test")
        });

        thread::sleep(Duration::from_millis(40));
        poster.post_one();
        assert_eq!(handle.join().unwrap(), Wakeup::Signaled);
    }
}
