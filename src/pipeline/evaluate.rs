//! The evaluator: compose the chain into one sink, then drive the source.

use super::{StageArena, StageId, StreamConfig};
use crate::error::Result;
use crate::ops::Element;
use crate::sink::{BoxSink, Sink};

/// What a single evaluation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Source elements pushed into the composed sink
    pub pushed: u64,
    /// Whether the traversal stopped before the source was exhausted
    pub short_circuited: bool,
}

/// Evaluate the chain ending at `tail` into `terminal`.
///
/// The source is traversed exactly once. An error from any sink or callback
/// aborts the traversal immediately; `end` is not called and whatever the
/// terminal sink accumulated so far is left incomplete.
pub(crate) fn run<T: Element>(
    arena: &StageArena<T>,
    tail: StageId,
    config: &StreamConfig,
    terminal: &mut dyn Sink<T>,
) -> Result<Outcome> {
    let mut sink: BoxSink<'_, T> = arena.wrap_sink(tail, Box::new(terminal), config)?;
    let source = arena.source(tail)?;
    let size = source.size_hint();
    let elements = source.traverse()?;

    trace_event!(
        debug,
        "evaluating chain ending at stage {} (size hint {:?})",
        tail.index(),
        size
    );

    let mut outcome = Outcome {
        pushed: 0,
        short_circuited: false,
    };

    sink.begin(size)?;
    for element in elements {
        sink.accept(element)?;
        outcome.pushed += 1;
        if config.short_circuit && sink.cancellation_requested() {
            trace_event!(trace, "cancellation requested after {} elements", outcome.pushed);
            outcome.short_circuited = true;
            break;
        }
    }
    sink.end()?;

    trace_event!(
        debug,
        "evaluation of stage {} pushed {} elements",
        tail.index(),
        outcome.pushed
    );

    #[cfg(feature = "metrics")]
    crate::metrics::record_evaluation(outcome.pushed, outcome.short_circuited);

    Ok(outcome)
}
