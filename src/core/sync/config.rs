/*!
 * Condition Variable Configuration
 *
 * Runtime knobs for diagnostics; none of them change wake semantics
 */

use crate::core::limits::{DEFAULT_COND_LABEL, DEFAULT_STALL_WARNING};
use std::time::Duration;

/// Configuration for a `TimeoutCond`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CondConfig {
    /// Name attached to every log event emitted by this instance
    pub label: &'static str,
    /// Warn when an unbounded wait has been blocked this long (re-armed each period)
    pub stall_warning: Option<Duration>,
}

impl Default for CondConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_COND_LABEL,
            stall_warning: None,
        }
    }
}

impl CondConfig {
    /// Configuration that reports stalled waiters after `DEFAULT_STALL_WARNING`
    pub const fn diagnostic() -> Self {
        Self {
            label: DEFAULT_COND_LABEL,
            stall_warning: Some(DEFAULT_STALL_WARNING),
        }
    }

    pub const fn with_label(mut self, label: &'static str) -> Self {
        self.label = label;
        self
    }

    pub const fn with_stall_warning(mut self, after: Duration) -> Self {
        self.stall_warning = Some(after);
        self
    }

    /// Stall threshold, ignoring a zero period
    pub(crate) fn stall_period(&self) -> Option<Duration> {
        self.stall_warning.filter(|d| !d.is_zero())
    }
}
