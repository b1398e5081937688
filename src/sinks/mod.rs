//! Terminal sink implementations.
//!
//! A terminal sink sits at the end of a composed chain and accumulates the
//! result of an evaluation. Each terminal operation builds a fresh one, so no
//! state is shared between evaluations.

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::sink::{SizeHint, Sink};

/// A sink that collects items into a vector, in arrival order.
#[derive(Debug)]
pub struct CollectSink<T> {
    items: Vec<T>,
    max_presize: usize,
}

impl<T> CollectSink<T> {
    /// Create a new collect sink that reserves at most `max_presize` slots
    /// from the size hint
    pub fn new(max_presize: usize) -> Self {
        Self {
            items: Vec::new(),
            max_presize,
        }
    }

    /// Get the collected items
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Take the collected items
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

impl<T> Default for CollectSink<T> {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl<T> Sink<T> for CollectSink<T> {
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        if let Some(n) = size {
            self.items.reserve(n.min(self.max_presize));
        }
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        self.items.push(item);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that left-folds items into an accumulator.
pub struct ReduceSink<T, F> {
    acc: Option<T>,
    combiner: F,
}

impl<T, F> ReduceSink<T, F>
where
    F: FnMut(T, T) -> Result<T>,
{
    /// Create a new reduce sink starting from `identity`
    pub fn new(identity: T, combiner: F) -> Self {
        Self {
            acc: Some(identity),
            combiner,
        }
    }

    /// Take the final accumulator
    pub fn into_result(self) -> Result<T> {
        self.acc
            .ok_or_else(|| Error::custom("reduce accumulator lost to a failed combiner"))
    }
}

impl<T, F> Sink<T> for ReduceSink<T, F>
where
    F: FnMut(T, T) -> Result<T>,
{
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        match self.acc.take() {
            Some(acc) => {
                self.acc = Some((self.combiner)(acc, item)?);
                Ok(())
            }
            None => Err(Error::custom("reduce sink reused after a failed combiner")),
        }
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that folds items using the first one as the starting value.
pub struct ReduceFirstSink<T, F> {
    acc: Option<T>,
    combiner: F,
}

impl<T, F> ReduceFirstSink<T, F>
where
    F: FnMut(T, T) -> T,
{
    pub fn new(combiner: F) -> Self {
        Self {
            acc: None,
            combiner,
        }
    }

    /// Take the final value, `None` if no item arrived
    pub fn into_result(self) -> Option<T> {
        self.acc
    }
}

impl<T, F> Sink<T> for ReduceFirstSink<T, F>
where
    F: FnMut(T, T) -> T,
{
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        self.acc = Some(match self.acc.take() {
            Some(acc) => (self.combiner)(acc, item),
            None => item,
        });
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that counts items
#[derive(Debug, Default)]
pub struct CountSink {
    count: usize,
}

impl CountSink {
    /// Create a new count sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current count
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<T> Sink<T> for CountSink {
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        Ok(())
    }

    fn accept(&mut self, _item: T) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that runs a callback on every item
pub struct ForEachSink<F> {
    action: F,
}

impl<F> ForEachSink<F> {
    pub fn new(action: F) -> Self {
        Self { action }
    }
}

impl<T, F> Sink<T> for ForEachSink<F>
where
    F: FnMut(T),
{
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        (self.action)(item);
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A sink that checks whether any item matches, cancelling on the first hit.
pub struct AnyMatchSink<F> {
    predicate: F,
    matched: bool,
}

impl<F> AnyMatchSink<F> {
    pub fn new(predicate: F) -> Self {
        Self {
            predicate,
            matched: false,
        }
    }

    /// Whether a matching item was seen
    pub fn matched(&self) -> bool {
        self.matched
    }
}

impl<T, F> Sink<T> for AnyMatchSink<F>
where
    F: FnMut(&T) -> bool,
{
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        if !self.matched && (self.predicate)(&item) {
            self.matched = true;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        self.matched
    }
}

/// A sink that keeps the first item and then cancels.
#[derive(Debug)]
pub struct FirstSink<T> {
    first: Option<T>,
}

impl<T> FirstSink<T> {
    pub fn new() -> Self {
        Self { first: None }
    }

    /// Take the first item, if any arrived
    pub fn into_first(self) -> Option<T> {
        self.first
    }
}

impl<T> Default for FirstSink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sink<T> for FirstSink<T> {
    fn begin(&mut self, _size: SizeHint) -> Result<()> {
        Ok(())
    }

    fn accept(&mut self, item: T) -> Result<()> {
        if self.first.is_none() {
            self.first = Some(item);
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        Ok(())
    }

    fn cancellation_requested(&self) -> bool {
        self.first.is_some()
    }
}

/// Wraps a terminal sink so an external token can stop the evaluation.
///
/// Cancellation is cooperative: the evaluator notices it after the element
/// in flight, then still calls `end`. The inner sink's own request is
/// honoured as well.
pub struct Cancellable<S> {
    inner: S,
    token: CancellationToken,
}

impl<S> Cancellable<S> {
    /// Wrap a sink with a cancellation token
    pub fn new(inner: S, token: CancellationToken) -> Self {
        Self { inner, token }
    }

    /// Get the token that cancels this sink
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Get a reference to the wrapped sink
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the inner sink
    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<T, S> Sink<T> for Cancellable<S>
where
    S: Sink<T>,
{
    fn begin(&mut self, size: SizeHint) -> Result<()> {
        self.inner.begin(size)
    }

    fn accept(&mut self, item: T) -> Result<()> {
        self.inner.accept(item)
    }

    fn end(&mut self) -> Result<()> {
        self.inner.end()
    }

    fn cancellation_requested(&self) -> bool {
        self.token.is_cancelled() || self.inner.cancellation_requested()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed<S: Sink<i32>>(sink: &mut S, items: &[i32]) {
        sink.begin(Some(items.len())).unwrap();
        for &item in items {
            sink.accept(item).unwrap();
        }
        sink.end().unwrap();
    }

    #[test]
    fn test_collect_sink() {
        let mut sink = CollectSink::default();
        feed(&mut sink, &[3, 1, 2]);
        assert_eq!(sink.items(), &[3, 1, 2]);
        assert_eq!(sink.into_items(), vec![3, 1, 2]);
    }

    #[test]
    fn test_reduce_sink_argument_order() {
        let mut sink = ReduceSink::new(String::new(), |acc: String, item: String| {
            Ok(format!("{}{}", acc, item))
        });
        sink.begin(None).unwrap();
        for part in ["a", "b", "c"] {
            sink.accept(part.to_string()).unwrap();
        }
        sink.end().unwrap();
        assert_eq!(sink.into_result().unwrap(), "abc");
    }

    #[test]
    fn test_reduce_sink_identity_on_empty() {
        let mut sink = ReduceSink::new(0, |a: i32, b: i32| Ok(a + b));
        feed(&mut sink, &[]);
        assert_eq!(sink.into_result().unwrap(), 0);
    }

    #[test]
    fn test_reduce_sink_rejects_items_after_failure() {
        let mut sink = ReduceSink::new(0, |acc: i32, item: i32| {
            if item < 0 {
                Err(Error::custom("negative"))
            } else {
                Ok(acc + item)
            }
        });
        sink.begin(None).unwrap();
        sink.accept(1).unwrap();
        assert!(matches!(sink.accept(-1), Err(Error::Custom(ref msg)) if msg == "negative"));
        assert!(matches!(
            sink.accept(2),
            Err(Error::Custom(ref msg)) if msg == "reduce sink reused after a failed combiner"
        ));
        assert!(sink.into_result().is_err());
    }

    #[test]
    fn test_reduce_first_sink() {
        let mut sink = ReduceFirstSink::new(|a: i32, b: i32| a.max(b));
        feed(&mut sink, &[4, 9, 2]);
        assert_eq!(sink.into_result(), Some(9));

        let mut empty = ReduceFirstSink::new(|a: i32, b: i32| a.max(b));
        feed(&mut empty, &[]);
        assert_eq!(empty.into_result(), None);
    }

    #[test]
    fn test_count_sink() {
        let mut sink = CountSink::new();
        feed(&mut sink, &[1, 1, 1, 1]);
        assert_eq!(sink.count(), 4);
    }

    #[test]
    fn test_for_each_sink() {
        let mut seen = Vec::new();
        let mut sink = ForEachSink::new(|x: i32| seen.push(x));
        feed(&mut sink, &[7, 8]);
        drop(sink);
        assert_eq!(seen, vec![7, 8]);
    }

    #[test]
    fn test_any_match_sink_requests_cancellation() {
        let mut sink = AnyMatchSink::new(|x: &i32| *x > 5);
        Sink::<i32>::begin(&mut sink, None).unwrap();
        sink.accept(1).unwrap();
        assert!(!Sink::<i32>::cancellation_requested(&sink));
        sink.accept(6).unwrap();
        assert!(Sink::<i32>::cancellation_requested(&sink));
        assert!(sink.matched());
    }

    #[test]
    fn test_first_sink() {
        let mut sink = FirstSink::new();
        sink.accept(11).unwrap();
        assert!(sink.cancellation_requested());
        sink.accept(12).unwrap();
        assert_eq!(sink.into_first(), Some(11));
    }

    #[test]
    fn test_cancellable_sink_follows_token() {
        let token = CancellationToken::new();
        let mut sink = Cancellable::new(CollectSink::<i32>::default(), token.clone());
        sink.accept(1).unwrap();
        assert!(!sink.cancellation_requested());
        token.cancel();
        assert!(sink.cancellation_requested());
        assert_eq!(sink.inner().items(), &[1]);
        assert!(sink.token().is_cancelled());
    }
}
