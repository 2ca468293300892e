/*!
 * Timeout Condition Variable
 *
 * A condition variable that can wait with a timeout, reports how much of the
 * timeout is left, and can be interrupted to wake every current waiter.
 */

pub mod core;
pub mod monitoring;

// Re-exports
pub use crate::core::errors::ProtocolViolation;
pub use crate::core::sync::{
    CondConfig, TimedWait, TimeoutCond, WaitError, WaitResult, WaiterCounter, WaiterGuard,
    WakeResult, Wakeup,
};
pub use monitoring::init_tracing;
