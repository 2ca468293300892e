/*!
 * Error Types
 * Usage-protocol violations with thiserror and miette support
 */

use miette::Diagnostic;
use thiserror::Error;

/// Misuse of a condition variable that leaves its invariants broken
///
/// These are never returned to the caller. The primitive panics with the
/// rendered message so the bug surfaces at the call site that caused it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Diagnostic)]
pub enum ProtocolViolation {
    #[error("waiter removed more times than it was added")]
    #[diagnostic(
        code(cond::waiter_underflow),
        help("Every waiter exit must be paired with exactly one waiter entry.")
    )]
    WaiterUnderflow,

    #[error("too many waiters; max is {max}")]
    #[diagnostic(
        code(cond::waiter_overflow),
        help("The waiter counter wrapped. Waiter entries are leaking without exits.")
    )]
    WaiterOverflow { max: u64 },

    #[error("wait called with a guard for a mutex this condition is not bound to")]
    #[diagnostic(
        code(cond::foreign_lock),
        help("Pass the guard obtained from TimeoutCond::lock(), not from another mutex.")
    )]
    ForeignLock,
}

impl ProtocolViolation {
    /// Abort the current thread with this violation
    #[cold]
    #[track_caller]
    pub(crate) fn raise(self) -> ! {
        panic!("{}", self)
    }
}
