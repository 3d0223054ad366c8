//! Cold start detection for Lambda functions.
//!
//! The first invocation served by an execution environment is a cold start.
//! Environments initialised for provisioned concurrency are never reported as
//! cold, since their initialisation happened ahead of any request.

use std::sync::atomic::{AtomicBool, Ordering};

/// Set until the first invocation in this process has been observed.
static IS_COLD_START: AtomicBool = AtomicBool::new(true);

const INITIALIZATION_TYPE_ENV: &str = "AWS_LAMBDA_INITIALIZATION_TYPE";
const PROVISIONED_CONCURRENCY: &str = "provisioned-concurrency";

/// Reports whether this invocation is a cold start, clearing the flag.
///
/// Exactly one caller per process observes `true`, even when called from
/// several threads.
///
/// # Example
///
/// ```
/// use lambda_envelope_tower::check_cold_start;
///
/// // Another test may already have consumed the first call.
/// let _ = check_cold_start();
///
/// assert!(!check_cold_start());
/// ```
pub fn check_cold_start() -> bool {
    let provisioned = std::env::var(INITIALIZATION_TYPE_ENV)
        .map(|v| v == PROVISIONED_CONCURRENCY)
        .unwrap_or(false);

    let first = IS_COLD_START.swap(false, Ordering::SeqCst);
    first && !provisioned
}

#[cfg(test)]
pub(crate) fn reset_cold_start_for_testing() {
    IS_COLD_START.store(true, Ordering::SeqCst);
}
