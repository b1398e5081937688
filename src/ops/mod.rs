//! Stage operations.
//!
//! Each non-Head stage carries exactly one [`StageOp`]. Right before an
//! evaluation the op turns a downstream sink into a new sink that performs the
//! op and then forwards. Stateless ops ([`stateless`]) handle one element at a
//! time; stateful ops ([`stateful`]) keep per-evaluation state and may hold
//! every element until `end`.

pub mod stateful;
pub mod stateless;

use std::cmp::Ordering;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::StreamConfig;
use crate::sink::BoxSink;
use crate::sources::ElementSource;

pub use stateful::{DistinctSink, SortedSink};
pub use stateless::{FilterSink, LimitSink, MapSink, PeekSink, SkipSink};

/// The element type a stream carries.
///
/// `Ord` backs `sorted`, `Hash + Eq` back `distinct`, `Clone` lets repeatable
/// sources hand out elements and lets `distinct` remember them.
pub trait Element: Clone + Ord + Hash + Send + Sync + 'static {}

impl<T> Element for T where T: Clone + Ord + Hash + Send + Sync + 'static {}

pub(crate) type Predicate<T> = Arc<dyn Fn(&T) -> Result<bool> + Send + Sync>;
pub(crate) type Transform<T> = Arc<dyn Fn(T) -> Result<T> + Send + Sync>;
pub(crate) type Comparator<T> = Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>;
pub(crate) type Inspector<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// The operation a stage performs.
pub enum StageOp<T> {
    /// The root of a chain. Holds the element source and wraps nothing.
    Head(Arc<dyn ElementSource<T>>),
    /// Forward an element only when the predicate holds.
    Filter(Predicate<T>),
    /// Forward the transformed element.
    Map(Transform<T>),
    /// Observe each element, then forward it unchanged.
    Peek(Inspector<T>),
    /// Drop the first `n` elements reaching the stage.
    Skip(usize),
    /// Forward at most `n` elements, then request cancellation.
    Limit(usize),
    /// Buffer everything and emit in ascending order at `end`.
    Sorted(Option<Comparator<T>>),
    /// Forward only the first occurrence of each value.
    Distinct,
}

impl<T> StageOp<T> {
    /// Short operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            StageOp::Head(_) => "head",
            StageOp::Filter(_) => "filter",
            StageOp::Map(_) => "map",
            StageOp::Peek(_) => "peek",
            StageOp::Skip(_) => "skip",
            StageOp::Limit(_) => "limit",
            StageOp::Sorted(_) => "sorted",
            StageOp::Distinct => "distinct",
        }
    }

    /// Whether the op keeps cross-element state for a whole evaluation.
    pub fn is_stateful(&self) -> bool {
        matches!(self, StageOp::Sorted(_) | StageOp::Distinct)
    }

    /// Whether the op may ask upstream to stop early.
    pub fn is_short_circuit(&self) -> bool {
        matches!(self, StageOp::Limit(_))
    }
}

impl<T: Element> StageOp<T> {
    /// Wrap `downstream` in a sink that performs this op before forwarding.
    ///
    /// Fails with [`Error::HeadWrap`] on a Head stage.
    pub fn wrap_sink<'a>(
        &self,
        downstream: BoxSink<'a, T>,
        config: &StreamConfig,
    ) -> Result<BoxSink<'a, T>> {
        let sink: BoxSink<'a, T> = match self {
            StageOp::Head(_) => return Err(Error::HeadWrap),
            StageOp::Filter(predicate) => Box::new(FilterSink::new(predicate.clone(), downstream)),
            StageOp::Map(transform) => Box::new(MapSink::new(transform.clone(), downstream)),
            StageOp::Peek(inspector) => Box::new(PeekSink::new(inspector.clone(), downstream)),
            StageOp::Skip(n) => Box::new(SkipSink::new(*n, downstream)),
            StageOp::Limit(n) => Box::new(LimitSink::new(*n, downstream)),
            StageOp::Sorted(comparator) => Box::new(SortedSink::new(
                comparator.clone(),
                config.buffer_size,
                config.short_circuit,
                downstream,
            )),
            StageOp::Distinct => Box::new(DistinctSink::new(config.buffer_size, downstream)),
        };
        Ok(sink)
    }
}

impl<T> Clone for StageOp<T> {
    fn clone(&self) -> Self {
        match self {
            StageOp::Head(source) => StageOp::Head(source.clone()),
            StageOp::Filter(predicate) => StageOp::Filter(predicate.clone()),
            StageOp::Map(transform) => StageOp::Map(transform.clone()),
            StageOp::Peek(inspector) => StageOp::Peek(inspector.clone()),
            StageOp::Skip(n) => StageOp::Skip(*n),
            StageOp::Limit(n) => StageOp::Limit(*n),
            StageOp::Sorted(comparator) => StageOp::Sorted(comparator.clone()),
            StageOp::Distinct => StageOp::Distinct,
        }
    }
}

impl<T> fmt::Debug for StageOp<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageOp::Skip(n) | StageOp::Limit(n) => write!(f, "{}({})", self.name(), n),
            StageOp::Sorted(Some(_)) => write!(f, "sorted_by"),
            _ => write!(f, "{}", self.name()),
        }
    }
}
