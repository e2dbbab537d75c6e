use std::time::Duration;

/// Delay before the next poll after `consecutive_errors` failures in a row
///
/// Linear in the error count and capped: `min(base * n, cap)`. Zero errors
/// means no delay.
pub fn backoff_delay(consecutive_errors: u32, base: Duration, cap: Duration) -> Duration {
    base.saturating_mul(consecutive_errors).min(cap)
}
