/// Success rate as a percentage rounded to one decimal place.
///
/// Zero processed attempts yields `0.0` (the divisor is `max(processed, 1)`).
/// `succeeded` is capped at `processed`, so the result always lies in `[0, 100]`.
pub fn success_rate_percent(succeeded: u64, processed: u64) -> f64 {
    let succeeded = succeeded.min(processed);
    let divisor = processed.max(1) as f64;
    // Scale by 1000 before dividing so that exact tenths (e.g. 82/100) stay exact.
    let tenths = (succeeded as f64 * 1000.0 / divisor).round();
    (tenths / 10.0).clamp(0.0, 100.0)
}
