//! Evaluation counters exported through the `metrics` facade.

/// Number of terminal evaluations started.
pub const EVALUATIONS: &str = "lazyweld_evaluations_total";

/// Number of source elements pushed into a composed sink chain.
pub const ELEMENTS_PUSHED: &str = "lazyweld_elements_pushed_total";

/// Number of evaluations stopped early by a cancellation request.
pub const SHORT_CIRCUITS: &str = "lazyweld_short_circuits_total";

pub(crate) fn record_evaluation(pushed: u64, short_circuited: bool) {
    ::metrics::counter!(EVALUATIONS).increment(1);
    ::metrics::counter!(ELEMENTS_PUSHED).increment(pushed);
    if short_circuited {
        ::metrics::counter!(SHORT_CIRCUITS).increment(1);
    }
}
