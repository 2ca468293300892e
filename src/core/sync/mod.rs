/*!
 * Synchronization Primitives
 *
 * `TimeoutCond`: a condition variable bound to a caller-owned mutex, with
 * bounded waits that report the time left and an interrupt that wakes and
 * retires every current waiter.
 *
 * # Architecture
 *
 * - **counter**: lock-free waiter count behind `has_waiters`
 * - **generation**: one-shot broadcast object for one epoch of waiters
 * - **timeout_cond**: the public API, composing the two under the caller's lock
 */

mod config;
mod counter;
mod generation;
mod timeout_cond;
mod types;

pub use config::CondConfig;
pub use counter::{WaiterCounter, WaiterGuard};
pub use timeout_cond::{TimeoutCond, WaitError, WaitResult};
pub use types::{TimedWait, WakeResult, Wakeup};
