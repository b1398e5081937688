//! Stage chains and the user-facing stream handle.
//!
//! A [`Stream`] is a reference to the tail stage of a chain. Stages live in an
//! append-only arena shared by every handle derived from the same source; each
//! record stores the index of its predecessor, and only the Head record holds
//! the element source. Adding an operation appends a record and returns a new
//! handle, so existing handles, and any branches derived from them, never see
//! the change. No element moves until a terminal operation runs.

mod evaluate;

pub use evaluate::Outcome;

use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use crate::error::{Error, IntoError, Result};
use crate::ops::{Element, StageOp};
use crate::sink::{BoxSink, Sink};
use crate::sinks::{
    AnyMatchSink, CollectSink, CountSink, FirstSink, ForEachSink, ReduceFirstSink, ReduceSink,
};
use crate::sources::{ElementSource, IterSource, VecSource};

/// Configuration for stream evaluation
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StreamConfig {
    /// Whether the driver stops pushing once the sink chain requests cancellation
    pub short_circuit: bool,
    /// Upper bound on capacity buffering stages reserve from a size hint
    pub buffer_size: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            short_circuit: true,
            buffer_size: 1024,
        }
    }
}

/// Index of a stage record inside a chain arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StageId(usize);

impl StageId {
    /// Position of the record in its arena
    pub fn index(&self) -> usize {
        self.0
    }
}

struct StageRecord<T> {
    previous: Option<StageId>,
    op: StageOp<T>,
    /// Handles and successor records pointing at this record.
    holders: usize,
}

struct Slots<T> {
    records: Vec<Option<StageRecord<T>>>,
    free: Vec<usize>,
}

impl<T> Slots<T> {
    fn get(&self, id: StageId) -> Result<&StageRecord<T>> {
        self.records
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| Error::custom(format!("unknown stage {}", id.0)))
    }
}

/// Index-addressed storage for the stages of every chain grown from one Head.
///
/// Each record counts the handles and successor records that point at it.
/// When the count drops to zero the record is freed, its predecessor loses a
/// holder in turn, and the slot is reused by a later append.
struct StageArena<T> {
    slots: RwLock<Slots<T>>,
}

impl<T> StageArena<T> {
    fn with_head(source: Arc<dyn ElementSource<T>>) -> (Self, StageId) {
        let head = StageRecord {
            previous: None,
            op: StageOp::Head(source),
            holders: 1,
        };
        let arena = Self {
            slots: RwLock::new(Slots {
                records: vec![Some(head)],
                free: Vec::new(),
            }),
        };
        (arena, StageId(0))
    }

    fn write(&self) -> RwLockWriteGuard<'_, Slots<T>> {
        // Bookkeeping never panics halfway through, so a poisoned lock still
        // guards consistent slots.
        self.slots.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, previous: StageId, op: StageOp<T>) -> StageId {
        let mut slots = self.write();
        if let Some(Some(record)) = slots.records.get_mut(previous.0) {
            record.holders += 1;
        }
        let record = Some(StageRecord {
            previous: Some(previous),
            op,
            holders: 1,
        });
        match slots.free.pop() {
            Some(index) => {
                slots.records[index] = record;
                StageId(index)
            }
            None => {
                slots.records.push(record);
                StageId(slots.records.len() - 1)
            }
        }
    }

    fn retain(&self, id: StageId) {
        if let Some(Some(record)) = self.write().records.get_mut(id.0) {
            record.holders += 1;
        }
    }

    /// Drop one hold on `id`, freeing it and every predecessor left unheld.
    fn release(&self, id: StageId) {
        // Freed ops drop after the lock: their closures may own other streams.
        let mut freed = Vec::new();
        let mut slots = self.write();
        let mut next = Some(id);
        while let Some(current) = next.take() {
            let Some(Some(record)) = slots.records.get_mut(current.0) else {
                break;
            };
            record.holders = record.holders.saturating_sub(1);
            if record.holders > 0 {
                break;
            }
            if let Some(record) = slots.records[current.0].take() {
                next = record.previous;
                freed.push(record);
            }
            slots.free.push(current.0);
        }
        drop(slots);
        trace_event!(trace, "released {} stage records", freed.len());
    }

    /// Number of records currently alive.
    #[cfg(test)]
    fn live_records(&self) -> usize {
        self.write().records.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of operation stages between `tail` and the Head.
    fn depth(&self, tail: StageId) -> Result<usize> {
        let slots = self.slots.read()?;
        let mut depth = 0;
        let mut current = slots.get(tail)?;
        while let Some(previous) = current.previous {
            depth += 1;
            current = slots.get(previous)?;
        }
        Ok(depth)
    }

    /// Operation names from Head to `tail`.
    fn op_names(&self, tail: StageId) -> Result<Vec<&'static str>> {
        let slots = self.slots.read()?;
        let mut names = Vec::new();
        let mut current = slots.get(tail)?;
        loop {
            names.push(current.op.name());
            match current.previous {
                Some(previous) => current = slots.get(previous)?,
                None => break,
            }
        }
        names.reverse();
        Ok(names)
    }

    /// Walk back to the Head and return its element source.
    fn source(&self, tail: StageId) -> Result<Arc<dyn ElementSource<T>>> {
        let slots = self.slots.read()?;
        let mut current = slots.get(tail)?;
        while let Some(previous) = current.previous {
            current = slots.get(previous)?;
        }
        match &current.op {
            StageOp::Head(source) => Ok(source.clone()),
            other => Err(Error::custom(format!(
                "stage chain is rooted at a {} stage instead of a Head",
                other.name()
            ))),
        }
    }
}

impl<T: Element> StageArena<T> {
    /// Walk back from `tail` to the Head, wrapping `terminal` once per stage.
    ///
    /// The walk runs tail first, so the sink returned performs the stages in
    /// source-to-terminal order.
    fn wrap_sink<'a>(
        &self,
        tail: StageId,
        terminal: BoxSink<'a, T>,
        config: &StreamConfig,
    ) -> Result<BoxSink<'a, T>> {
        let slots = self.slots.read()?;
        let mut sink = terminal;
        let mut current = slots.get(tail)?;
        while let Some(previous) = current.previous {
            sink = current.op.wrap_sink(sink, config)?;
            current = slots.get(previous)?;
        }
        Ok(sink)
    }
}

/// One counted hold on a stage record.
struct StageRef<T> {
    arena: Arc<StageArena<T>>,
    id: StageId,
}

impl<T> Clone for StageRef<T> {
    fn clone(&self) -> Self {
        self.arena.retain(self.id);
        Self {
            arena: self.arena.clone(),
            id: self.id,
        }
    }
}

impl<T> Drop for StageRef<T> {
    fn drop(&mut self) {
        self.arena.release(self.id);
    }
}

/// A lazy stream: a handle on the tail stage of a chain.
///
/// Intermediate operations return a new handle and leave `self` untouched.
/// Terminal operations compose the chain into one sink and traverse the
/// source exactly once.
///
/// # Examples
///
/// ```rust
/// use lazyweld::prelude::*;
///
/// fn main() -> Result<()> {
///     let numbers = Stream::of(vec![4, 3, 2, 1, 1]);
///
///     let evens = numbers.filter(|x| x % 2 == 0).map(|x| x + 10).sorted();
///     assert_eq!(evens.collect()?, vec![12, 14]);
///
///     assert_eq!(numbers.reduce(0, |a, b| a + b)?, 11);
///     Ok(())
/// }
/// ```
pub struct Stream<T> {
    stage: StageRef<T>,
    config: StreamConfig,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            stage: self.stage.clone(),
            config: self.config.clone(),
        }
    }
}

impl<T: Element> Stream<T> {
    /// Create a stream over any element source
    pub fn from_source<S>(source: S) -> Self
    where
        S: ElementSource<T> + 'static,
    {
        let (arena, id) = StageArena::with_head(Arc::new(source));
        Self {
            stage: StageRef {
                arena: Arc::new(arena),
                id,
            },
            config: StreamConfig::default(),
        }
    }

    /// Create a repeatable stream over a vector
    pub fn of(items: Vec<T>) -> Self {
        Self::from_source(VecSource::new(items))
    }

    /// Create a stream that can be evaluated only once
    pub fn single_pass<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_source(IterSource::new(iter.into_iter()))
    }

    /// Replace the evaluation configuration
    pub fn with_config(mut self, config: StreamConfig) -> Self {
        self.config = config;
        self
    }

    /// Set whether evaluation stops early on a cancellation request
    pub fn short_circuit(mut self, enabled: bool) -> Self {
        self.config.short_circuit = enabled;
        self
    }

    /// Set the reservation cap for buffering stages
    pub fn buffer_size(mut self, size: usize) -> Self {
        self.config.buffer_size = size;
        self
    }

    /// Get the evaluation configuration
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Identifier of this handle's tail stage
    pub fn stage_id(&self) -> StageId {
        self.stage.id
    }

    /// Number of operations chained onto the Head
    pub fn depth(&self) -> Result<usize> {
        self.stage.arena.depth(self.stage.id)
    }

    /// Operation names from Head to tail, e.g. `["head", "filter", "sorted"]`
    pub fn describe(&self) -> Result<Vec<&'static str>> {
        self.stage.arena.op_names(self.stage.id)
    }

    fn push(&self, op: StageOp<T>) -> Self {
        trace_event!(
            debug,
            "appending {:?} stage after stage {} (stateful: {}, short-circuit: {})",
            op,
            self.stage.id.index(),
            op.is_stateful(),
            op.is_short_circuit()
        );
        let arena = self.stage.arena.clone();
        let id = arena.append(self.stage.id, op);
        Self {
            stage: StageRef { arena, id },
            config: self.config.clone(),
        }
    }

    /// Keep only elements matching the predicate
    pub fn filter<F>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.push(StageOp::Filter(Arc::new(move |item: &T| -> Result<bool> {
            Ok(predicate(item))
        })))
    }

    /// Keep only elements matching a fallible predicate
    pub fn try_filter<F, E>(&self, predicate: F) -> Self
    where
        F: Fn(&T) -> std::result::Result<bool, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.push(StageOp::Filter(Arc::new(move |item: &T| -> Result<bool> {
            predicate(item).into_callback_error()
        })))
    }

    /// Transform every element
    pub fn map<F>(&self, transform: F) -> Self
    where
        F: Fn(T) -> T + Send + Sync + 'static,
    {
        self.push(StageOp::Map(Arc::new(move |item: T| -> Result<T> {
            Ok(transform(item))
        })))
    }

    /// Transform every element with a fallible function
    pub fn try_map<F, E>(&self, transform: F) -> Self
    where
        F: Fn(T) -> std::result::Result<T, E> + Send + Sync + 'static,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.push(StageOp::Map(Arc::new(move |item: T| -> Result<T> {
            transform(item).into_callback_error()
        })))
    }

    /// Observe every element as it passes
    pub fn peek<F>(&self, inspector: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.push(StageOp::Peek(Arc::new(inspector)))
    }

    /// Drop the first `n` elements
    pub fn skip(&self, n: usize) -> Self {
        self.push(StageOp::Skip(n))
    }

    /// Keep at most `n` elements, stopping the traversal early when possible
    pub fn limit(&self, n: usize) -> Self {
        self.push(StageOp::Limit(n))
    }

    /// Sort elements in ascending order
    pub fn sorted(&self) -> Self {
        self.push(StageOp::Sorted(None))
    }

    /// Sort elements with a comparator. The sort is stable.
    pub fn sorted_by<F>(&self, compare: F) -> Self
    where
        F: Fn(&T, &T) -> Ordering + Send + Sync + 'static,
    {
        self.push(StageOp::Sorted(Some(Arc::new(compare))))
    }

    /// Drop repeated values, keeping each value's first occurrence
    pub fn distinct(&self) -> Self {
        self.push(StageOp::Distinct)
    }

    /// Drive the chain into a caller-supplied terminal sink
    pub fn evaluate(&self, terminal: &mut dyn Sink<T>) -> Result<Outcome> {
        evaluate::run(&self.stage.arena, self.stage.id, &self.config, terminal)
    }

    /// Collect every element into a vector, in arrival order
    pub fn collect(&self) -> Result<Vec<T>> {
        let mut sink = CollectSink::new(self.config.buffer_size);
        self.evaluate(&mut sink)?;
        Ok(sink.into_items())
    }

    /// Left-fold every element into `identity` with `combiner(acc, item)`
    pub fn reduce<F>(&self, identity: T, mut combiner: F) -> Result<T>
    where
        F: FnMut(T, T) -> T,
    {
        self.try_reduce(identity, move |acc, item| {
            Ok::<T, std::convert::Infallible>(combiner(acc, item))
        })
    }

    /// Left-fold with a fallible combiner
    pub fn try_reduce<F, E>(&self, identity: T, mut combiner: F) -> Result<T>
    where
        F: FnMut(T, T) -> std::result::Result<T, E>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut sink = ReduceSink::new(identity, move |acc: T, item: T| {
            combiner(acc, item).into_callback_error()
        });
        self.evaluate(&mut sink)?;
        sink.into_result()
    }

    /// Count the elements reaching the end of the chain
    pub fn count(&self) -> Result<usize> {
        let mut sink = CountSink::new();
        self.evaluate(&mut sink)?;
        Ok(sink.count())
    }

    /// Run a callback on every element
    pub fn for_each<F>(&self, action: F) -> Result<()>
    where
        F: FnMut(T),
    {
        let mut sink = ForEachSink::new(action);
        self.evaluate(&mut sink).map(|_| ())
    }

    /// Whether any element matches, stopping at the first match
    pub fn any_match<F>(&self, predicate: F) -> Result<bool>
    where
        F: FnMut(&T) -> bool,
    {
        let mut sink = AnyMatchSink::new(predicate);
        self.evaluate(&mut sink)?;
        Ok(sink.matched())
    }

    /// The first element, stopping the traversal once it is found
    pub fn find_first(&self) -> Result<Option<T>> {
        let mut sink = FirstSink::new();
        self.evaluate(&mut sink)?;
        Ok(sink.into_first())
    }

    /// The smallest element, or `None` when the stream is empty
    pub fn min(&self) -> Result<Option<T>> {
        let mut sink = ReduceFirstSink::new(|a: T, b: T| a.min(b));
        self.evaluate(&mut sink)?;
        Ok(sink.into_result())
    }

    /// The largest element, or `None` when the stream is empty
    pub fn max(&self) -> Result<Option<T>> {
        let mut sink = ReduceFirstSink::new(|a: T, b: T| a.max(b));
        self.evaluate(&mut sink)?;
        Ok(sink.into_result())
    }
}

impl<T: Element> FromIterator<T> for Stream<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::of(iter.into_iter().collect())
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stream")
            .field("tail", &self.stage.id)
            .field("config", &self.config)
            .finish()
    }
}
