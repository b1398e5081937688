//! # Lazy push-based stream pipelines for Rust
//!
//! This crate provides a lazily evaluated stream engine in the style of a
//! reference pipeline: stages are declared up front, and nothing runs until a
//! terminal operation composes them into a single chain of sinks and walks
//! the source once.
//!
//! ## Core Concepts
//!
//! - **Element Source**: An ordered, finite collection the stream reads from
//! - **Stage**: One node of the chain, either the Head or an operation layered on a previous stage
//! - **Sink**: The push protocol (`begin`, `accept`, `end`, cancellation) each stage implements
//! - **Stream**: The handle on a chain's tail; chaining returns a new handle
//! - **Terminal operation**: Composes the sinks back to front and drives the source forward
//!
//! Stateless operations (`filter`, `map`, `peek`, `skip`, `limit`) handle one
//! element at a time. Stateful operations (`sorted`, `distinct`) keep state for
//! the whole evaluation; `sorted` emits nothing until the source is exhausted.
//!
//! ## Example
//!
//! ```rust
//! use lazyweld::prelude::*;
//!
//! fn main() -> Result<()> {
//!     let numbers = Stream::of(vec![4, 3, 2, 1, 1]);
//!
//!     let odds = numbers.filter(|x| x % 2 != 0).map(|x| x + 10).distinct();
//!     assert_eq!(odds.collect()?, vec![13, 11]);
//!
//!     let total = numbers.reduce(0, |acc, x| acc + x)?;
//!     assert_eq!(total, 11);
//!     Ok(())
//! }
//! ```

#[macro_use]
mod tracing_support;

pub mod error;
pub mod ops;
pub mod pipeline;
pub mod sink;
pub mod sinks;
pub mod sources;

// Re-export commonly used items
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::ops::Element;
    pub use crate::pipeline::{Outcome, Stream, StreamConfig};
    pub use crate::sink::{SizeHint, Sink};
    pub use crate::sinks::Cancellable;
    pub use crate::sources::{ElementSource, FnSource, Instrumented, IterSource, VecSource};
}

// Re-export main error type
pub use error::{Error, Result};
pub use pipeline::Stream;

// Feature flags for optional dependencies
#[cfg(feature = "metrics")]
pub mod metrics;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
