//! Sinks for stateful operations.
//!
//! Their state (a sort buffer, a seen-set) lives in the sink, and a fresh sink
//! is built for every evaluation, so nothing leaks between evaluations.

use std::collections::HashSet;
use std::hash::Hash;

use super::Comparator;
use crate::error::Result;
use crate::sink::{BoxSink, SizeHint, Sink};

/// A sink that buffers every element and emits them sorted at `end`.
///
/// Sorting is stable. With no comparator the element's natural order is used.
pub struct SortedSink<'a, T> {
    buffer: Vec<T>,
    comparator: Option<Comparator<T>>,
    max_presize: usize,
    short_circuit: bool,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> SortedSink<'a, T> {
    pub(crate) fn new(
        comparator: Option<Comparator<T>>,
        max_presize: usize,
        short_circuit: bool,
        downstream: BoxSink<'a, T>,
    ) -> Self {
        Self {
            buffer: Vec::new(),
            comparator,
            max_presize,
            short_circuit,
            downstream,
        }
    }
}

impl<T: Ord> Sink<T> for SortedSink<'_, T> {
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        // Downstream begins only once the buffer is flushed.
        if let Some(n) = size {
            self.buffer.reserve(n.min(self.max_presize));
        }
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        self.buffer.push(item);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        let mut buffer = std::mem::take(&mut self.buffer);
        match &self.comparator {
            Some(cmp) => buffer.sort_by(|a, b| cmp(a, b)),
            None => buffer.sort(),
        }

        self.downstream.begin(Some(buffer.len()))?;
        for item in buffer {
            if self.short_circuit && self.downstream.cancellation_requested() {
                break;
            }
            self.downstream.accept(item)?;
        }
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}

/// A sink that forwards only the first occurrence of each value.
pub struct DistinctSink<'a, T> {
    seen: HashSet<T>,
    max_presize: usize,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> DistinctSink<'a, T> {
    pub(crate) fn new(max_presize: usize, downstream: BoxSink<'a, T>) -> Self {
        Self {
            seen: HashSet::new(),
            max_presize,
            downstream,
        }
    }
}

impl<T> Sink<T> for DistinctSink<'_, T>
where
    T: Clone + Eq + Hash,
{
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        if let Some(n) = size {
            self.seen.reserve(n.min(self.max_presize));
        }
        self.downstream.begin(None)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        if self.seen.contains(&item) {
            return Ok(());
        }
        self.seen.insert(item.clone());
        self.downstream.accept(item)
    }

    fn end(&mut self) -> Result<()> {
        self.seen.clear();
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}
