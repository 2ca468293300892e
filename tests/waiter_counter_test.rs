/*!
 * Waiter Counter Property Tests
 *
 * Paired entries/exits keep `has_waiters` in step with a model stack
 */

use proptest::prelude::*;
use std::panic;
use timeout_cond::WaiterCounter;

proptest! {
    #[test]
    fn prop_paired_entries_track_model(ops in prop::collection::vec(any::<bool>(), 0..200)) {
        let counter = WaiterCounter::new();
        let mut guards = Vec::new();
        prop_assert!(!counter.has_waiters());

        for enter in ops {
            if enter {
                guards.push(counter.enter());
            } else {
                guards.pop();
            }
            prop_assert_eq!(counter.count(), guards.len() as u64);
            prop_assert_eq!(counter.has_waiters(), !guards.is_empty());
        }

        guards.clear();
        prop_assert!(!counter.has_waiters());
    }

    #[test]
    fn prop_extra_remove_is_fatal(adds in 0usize..50) {
        let counter = WaiterCounter::new();
        for _ in 0..adds {
            counter.add();
        }
        for _ in 0..adds {
            counter.remove();
        }

        let result = panic::catch_unwind(panic::AssertUnwindSafe(|| counter.remove()));
        prop_assert!(result.is_err());
    }
}
