use std::time::Duration;

/// Time left to sleep so a batch that took `work` lasts its whole `budget`.
///
/// Never negative: an overrun batch gets no delay and the generator simply
/// falls behind the target rate.
pub fn pacing_delay(budget: Duration, work: Duration) -> Duration {
    budget.saturating_sub(work)
}
