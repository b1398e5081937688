//! Element sources for the pipeline engine.
//!
//! A source is the ordered, finite collection a Head stage reads from. The
//! engine only asks it for a forward traversal and an optional size hint.
//! Repeatable sources ([`VecSource`], [`FnSource`]) can back any number of
//! evaluations; single-pass sources ([`IterSource`]) fail the second time.

use futures::{StreamExt, TryStreamExt};
use futures_core::Stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{Error, IntoError, Result};
use crate::sink::SizeHint;

/// An ordered, finite sequence of elements.
///
/// Concurrent evaluations of the same stream call `traverse` concurrently, so
/// implementations that are not independently re-traversable must say so by
/// returning [`Error::SourceConsumed`] instead of handing out a shared cursor.
///
/// # Examples
///
/// ```rust
/// use lazyweld::error::Result;
/// use lazyweld::sink::SizeHint;
/// use lazyweld::sources::ElementSource;
///
/// struct Countdown(u32);
///
/// impl ElementSource<u32> for Countdown {
///     fn traverse(&self) -> Result<Box<dyn Iterator<Item = u32> + '_>> {
///         Ok(Box::new((1..=self.0).rev()))
///     }
///
///     fn size_hint(&self) -> SizeHint {
///         Some(self.0 as usize)
///     }
/// }
/// ```
pub trait ElementSource<T>: Send + Sync {
    /// Start a new forward traversal.
    fn traverse(&self) -> Result<Box<dyn Iterator<Item = T> + '_>>;

    /// Advisory element count. Defaults to unknown.
    fn size_hint(&self) -> SizeHint {
        None
    }
}

impl<T, S> ElementSource<T> for Arc<S>
where
    S: ElementSource<T> + ?Sized,
{
    fn traverse(&self) -> Result<Box<dyn Iterator<Item = T> + '_>> {
        (**self).traverse()
    }

    fn size_hint(&self) -> SizeHint {
        (**self).size_hint()
    }
}

/// A repeatable source backed by a shared slice.
#[derive(Debug)]
pub struct VecSource<T> {
    items: Arc<[T]>,
}

impl<T> VecSource<T> {
    /// Create a new vector source
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into(),
        }
    }

    /// Number of elements in the source
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the source holds no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Clone for VecSource<T> {
    fn clone(&self) -> Self {
        Self {
            items: self.items.clone(),
        }
    }
}

impl<T> From<Vec<T>> for VecSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}

impl<T> ElementSource<T> for VecSource<T>
where
    T: Clone + Send + Sync,
{
    fn traverse(&self) -> Result<Box<dyn Iterator<Item = T> + '_>> {
        Ok(Box::new(self.items.iter().cloned()))
    }

    fn size_hint(&self) -> SizeHint {
        Some(self.items.len())
    }
}

/// A repeatable source that builds a fresh iterator for every traversal.
pub struct FnSource<F> {
    factory: F,
}

impl<F> FnSource<F> {
    /// Create a source from an iterator factory
    pub fn new(factory: F) -> Self {
        Self { factory }
    }
}

impl<F, I, T> ElementSource<T> for FnSource<F>
where
    F: Fn() -> I + Send + Sync,
    I: IntoIterator<Item = T>,
    I::IntoIter: 'static,
{
    fn traverse(&self) -> Result<Box<dyn Iterator<Item = T> + '_>> {
        Ok(Box::new((self.factory)().into_iter()))
    }
}

/// A single-pass source over an owned iterator.
///
/// The first traversal takes the iterator. Any later traversal fails with
/// [`Error::SourceConsumed`].
pub struct IterSource<I> {
    iter: Mutex<Option<I>>,
    size: SizeHint,
}

impl<I: Iterator> IterSource<I> {
    /// Create a single-pass source
    pub fn new(iter: I) -> Self {
        let size = match iter.size_hint() {
            (lower, Some(upper)) if lower == upper => Some(lower),
            _ => None,
        };
        Self {
            iter: Mutex::new(Some(iter)),
            size,
        }
    }

    /// Whether the iterator has already been handed out
    pub fn is_consumed(&self) -> bool {
        self.iter.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }
}

impl<I, T> ElementSource<T> for IterSource<I>
where
    I: Iterator<Item = T> + Send + 'static,
{
    fn traverse(&self) -> Result<Box<dyn Iterator<Item = T> + '_>> {
        match self.iter.lock()?.take() {
            Some(iter) => Ok(Box::new(iter)),
            None => {
                trace_event!(warn, "rejected second traversal of a single-pass source");
                Err(Error::SourceConsumed)
            }
        }
    }

    fn size_hint(&self) -> SizeHint {
        if self.is_consumed() {
            None
        } else {
            self.size
        }
    }
}

/// A source wrapper that counts how many traversals were started.
pub struct Instrumented<S> {
    inner: S,
    traversals: AtomicUsize,
}

impl<S> Instrumented<S> {
    /// Wrap a source
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            traversals: AtomicUsize::new(0),
        }
    }

    /// Number of traversals started so far
    pub fn traversals(&self) -> usize {
        self.traversals.load(Ordering::SeqCst)
    }

    /// Get a reference to the wrapped source
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

impl<S, T> ElementSource<T> for Instrumented<S>
where
    S: ElementSource<T>,
{
    fn traverse(&self) -> Result<Box<dyn Iterator<Item = T> + '_>> {
        self.traversals.fetch_add(1, Ordering::SeqCst);
        self.inner.traverse()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Drain a finite async stream into a repeatable source.
pub async fn from_stream<S>(stream: S) -> VecSource<S::Item>
where
    S: Stream,
{
    let items: Vec<S::Item> = stream.collect().await;
    VecSource::new(items)
}

/// Drain a finite fallible async stream into a repeatable source.
///
/// The first stream error aborts ingestion and surfaces as
/// [`Error::SourceFailed`].
pub async fn from_try_stream<S, T, E>(stream: S) -> Result<VecSource<T>>
where
    S: Stream<Item = std::result::Result<T, E>>,
    E: std::error::Error + Send + Sync + 'static,
{
    let items = stream.try_collect::<Vec<T>>().await.into_source_error()?;
    Ok(VecSource::new(items))
}
