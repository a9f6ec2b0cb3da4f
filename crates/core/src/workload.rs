//! Placeholder workload executed by every triggered function.

use crate::outcome::DispatchResult;

/// Default factorial argument.
pub const DEFAULT_WORKLOAD_N: u32 = 20;

/// Largest `n` whose factorial fits in a `u64`.
pub const MAX_WORKLOAD_N: u32 = 20;

/// `n!`, or `None` when it overflows `u64`.
pub fn factorial(n: u32) -> Option<u64> {
    (2..=u64::from(n)).try_fold(1u64, u64::checked_mul)
}

/// Run the workload and render it as a `text/plain` result.
pub fn run(n: u32) -> DispatchResult {
    match factorial(n) {
        Some(value) => DispatchResult::ok(format!("{n}! = {value}")),
        None => DispatchResult::ok(format!("{n}! = overflow")),
    }
}
