/*!
 * Limits and Constants
 *
 * Centralized location for the thresholds used by the synchronization code.
 */

use std::time::Duration;

// =============================================================================
// WAITER ACCOUNTING
// =============================================================================

/// Largest number of concurrently registered waiters
/// Reaching it means entries are leaking; the counter treats it as fatal
pub const MAX_WAITERS: u64 = u64::MAX;

// =============================================================================
// DIAGNOSTICS
// =============================================================================

/// Default label attached to condition variable log events
pub const DEFAULT_COND_LABEL: &str = "timeout_cond";

/// Stall threshold used by `CondConfig::diagnostic()` (30s)
/// An unbounded wait blocked this long is reported once per period
pub const DEFAULT_STALL_WARNING: Duration = Duration::from_secs(30);

/// Environment variable selecting JSON log output
pub const TRACE_JSON_ENV: &str = "TIMEOUT_COND_TRACE_JSON";
