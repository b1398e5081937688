//! Logging macros.
//!
//! With the `tracing` feature these forward to the `tracing` crate. Without it
//! they only type-check their format arguments and emit nothing.

#[cfg(feature = "tracing")]
macro_rules! trace_event {
    (trace, $($arg:tt)*) => { ::tracing::trace!($($arg)*) };
    (debug, $($arg:tt)*) => { ::tracing::debug!($($arg)*) };
    (warn, $($arg:tt)*) => { ::tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_event {
    ($level:ident, $($arg:tt)*) => {{
        let _ = format_args!($($arg)*);
    }};
}
