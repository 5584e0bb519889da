#![forbid(unsafe_code)]

//! Event macros used across the workspace.
//!
//! `debug!`, `trace!` and `warn!` forward to `tracing` when the `tracing`
//! feature is on. Otherwise they expand to nothing and their arguments are
//! never evaluated. Spans are opened with `tracing::debug_span!` directly,
//! behind `#[cfg(feature = "tracing")]`, at the few call sites that need them.

#[cfg(feature = "tracing")]
pub use tracing::{debug, trace, warn};

#[cfg(not(feature = "tracing"))]
mod disabled {
    /// Discards a debug event.
    #[macro_export]
    macro_rules! debug {
        ($($event:tt)*) => {};
    }

    /// Discards a trace event.
    #[macro_export]
    macro_rules! trace {
        ($($event:tt)*) => {};
    }

    /// Discards a warning.
    #[macro_export]
    macro_rules! warn {
        ($($event:tt)*) => {};
    }
}
