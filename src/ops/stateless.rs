//! Sinks for stateless operations.
//!
//! These handle one element at a time and forward `begin`, `end` and
//! cancellation straight to their downstream.

use super::{Inspector, Predicate, Transform};
use crate::error::Result;
use crate::sink::{BoxSink, SizeHint, Sink};

/// A sink that forwards elements matching a predicate.
pub struct FilterSink<'a, T> {
    predicate: Predicate<T>,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> FilterSink<'a, T> {
    /// Create a new filter sink
    pub(crate) fn new(predicate: Predicate<T>, downstream: BoxSink<'a, T>) -> Self {
        Self {
            predicate,
            downstream,
        }
    }
}

impl<T> Sink<T> for FilterSink<'_, T> {
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        // The number of survivors is unknown.
        self.downstream.begin(None)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        if (self.predicate)(&item)? {
            self.downstream.accept(item)
        } else {
            Ok(())
        }
    }

    fn end(&mut self) -> Result<()> {
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}

/// A sink that forwards transformed elements.
pub struct MapSink<'a, T> {
    transform: Transform<T>,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> MapSink<'a, T> {
    /// Create a new map sink
    pub(crate) fn new(transform: Transform<T>, downstream: BoxSink<'a, T>) -> Self {
        Self {
            transform,
            downstream,
        }
    }
}

impl<T> Sink<T> for MapSink<'_, T> {
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        self.downstream.begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        let mapped = (self.transform)(item)?;
        self.downstream.accept(mapped)
    }

    fn end(&mut self) -> Result<()> {
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}

/// A sink that lets a callback observe each element before forwarding it.
pub struct PeekSink<'a, T> {
    inspector: Inspector<T>,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> PeekSink<'a, T> {
    pub(crate) fn new(inspector: Inspector<T>, downstream: BoxSink<'a, T>) -> Self {
        Self {
            inspector,
            downstream,
        }
    }
}

impl<T> Sink<T> for PeekSink<'_, T> {
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        self.downstream.begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        (self.inspector)(&item);
        self.downstream.accept(item)
    }

    fn end(&mut self) -> Result<()> {
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}

/// A sink that drops the first `n` elements.
pub struct SkipSink<'a, T> {
    skip: usize,
    remaining: usize,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> SkipSink<'a, T> {
    pub(crate) fn new(skip: usize, downstream: BoxSink<'a, T>) -> Self {
        Self {
            skip,
            remaining: skip,
            downstream,
        }
    }
}

impl<T> Sink<T> for SkipSink<'_, T> {
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        self.remaining = self.skip;
        self.downstream.begin(size.map(|n| n.saturating_sub(self.skip)))
    }

    fn accept(&mut self, item: T) -> Result<()> {
        if self.remaining > 0 {
            self.remaining -= 1;
            Ok(())
        } else {
            self.downstream.accept(item)
        }
    }

    fn end(&mut self) -> Result<()> {
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.downstream.cancellation_requested()
    }
}

/// A sink that forwards at most `n` elements.
///
/// This is the one stateless sink that originates a cancellation request:
/// once its quota is used up it reports `true` regardless of downstream.
/// Elements pushed after that point are ignored, so results stay correct even
/// when the driver does not poll for cancellation.
pub struct LimitSink<'a, T> {
    limit: usize,
    remaining: usize,
    downstream: BoxSink<'a, T>,
}

impl<'a, T> LimitSink<'a, T> {
    pub(crate) fn new(limit: usize, downstream: BoxSink<'a, T>) -> Self {
        Self {
            limit,
            remaining: limit,
            downstream,
        }
    }
}

impl<T> Sink<T> for LimitSink<'_, T> {
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        self.remaining = self.limit;
        self.downstream.begin(size.map(|n| n.min(self.limit)))
    }

    fn accept(&mut self, item: T) -> Result<()> {
        if self.remaining == 0 {
            return Ok(());
        }
        self.remaining -= 1;
        self.downstream.accept(item)
    }

    fn end(&mut self) -> Result<()> {
        self.downstream.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.remaining == 0 || self.downstream.cancellation_requested()
    }
}
