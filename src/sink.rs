//! The push-based sink protocol.
//!
//! Every stage of a stream is turned into a [`Sink`] right before evaluation.
//! Elements are pushed through the composed chain with `begin`, zero or more
//! `accept` calls, and a single `end`. A sink that wraps a downstream sink
//! forwards `cancellation_requested` to it instead of answering itself, so a
//! short-circuiting terminal can stop the whole chain.

use crate::error::Result;

/// An advisory element count passed to [`Sink::begin`].
///
/// `None` means the count is unknown. Sinks must never rely on the hint
/// being present or accurate.
pub type SizeHint = Option<usize>;

/// A push-based consumer of elements.
///
/// # Examples
///
/// ```rust
/// use lazyweld::error::Result;
/// use lazyweld::sink::{Sink, SizeHint};
///
/// struct SumSink {
///     total: i64,
/// }
///
/// impl Sink<i64> for SumSink {
///     fn begin(&mut self, _size: SizeHint) -> Result<()> {
///         Ok(())
///     }
///
///     fn accept(&mut self, item: i64) -> Result<()> {
///         self.total += item;
///         Ok(())
///     }
///
///     fn end(&mut self) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Sink<T> {
    /// Called once before any element flows.
    fn begin(&mut self, size: SizeHint) -> Result<()>;

    /// Called once per element, in the order the upstream emits them.
    fn accept(&mut self, item: T) -> Result<()>;

    /// Called once after the last `accept`. Buffering sinks flush here.
    fn end(&mut self) -> Result<()>;

    /// Whether this sink wants no more elements.
    ///
    /// The default never cancels. Wrapping sinks must delegate to their
    /// downstream rather than deciding on their own.
    fn cancellation_requested(&self) -> bool {
        false
    }
}

impl<T, S> Sink<T> for &mut S
where
    S: Sink<T> + ?Sized,
{
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        (**self).begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        (**self).accept(item)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn cancellation_requested(&self) -> bool {
        (**self).cancellation_requested()
    }
}

impl<T, S> Sink<T> for Box<S>
where
    S: Sink<T> + ?Sized,
{
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        (**self).begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        (**self).accept(item)
    }

    fn end(&mut self) -> Result<()> {
        (**self).end()
    }

    fn cancellation_requested(&self) -> bool {
        (**self).cancellation_requested()
    }
}

/// A type-erased sink chain built for a single evaluation.
pub type BoxSink<'a, T> = Box<dyn Sink<T> + 'a>;
