#![forbid(unsafe_code)]

//! Scroll-event coalescing for the virtual scroller.
//!
//! Browsers can fire dozens of scroll events per frame. Recomputing the
//! window for each one is wasted work, so [`ScrollCoalescer`] folds them:
//!
//! - The first scroll event in a frame marks a recompute for that frame.
//! - Every scroll event pushes a trailing deadline `debounce` into the future,
//!   so one more recompute runs after scrolling settles.
//!
//! Time is supplied by the caller, which keeps the coalescer deterministic.
//!
//! # Usage
//!
//! ```
//! use std::time::Duration;
//! use fchat_render::ScrollCoalescer;
//!
//! let mut c = ScrollCoalescer::new(Duration::from_millis(10));
//! c.on_scroll(Duration::from_millis(0));
//! c.on_scroll(Duration::from_millis(1));
//! assert!(c.poll(Duration::from_millis(2)));   // frame recompute
//! assert!(!c.poll(Duration::from_millis(5)));  // nothing new
//! assert!(c.poll(Duration::from_millis(11)));  // trailing recompute
//! assert!(!c.poll(Duration::from_millis(30)));
//! ```

use std::time::Duration;

/// Folds scroll events into at most one recompute per frame plus one trailing recompute.
///
/// All operations are O(1).
#[derive(Debug, Clone, Default)]
pub struct ScrollCoalescer {
    debounce: Duration,
    frame_pending: bool,
    trailing_deadline: Option<Duration>,
    /// Scroll events absorbed into an already pending frame.
    coalesced: u64,
}

impl ScrollCoalescer {
    #[must_use]
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            ..Self::default()
        }
    }

    /// Record a scroll event observed at `now`.
    pub fn on_scroll(&mut self, now: Duration) {
        if self.frame_pending {
            self.coalesced += 1;
        }
        self.frame_pending = true;
        self.trailing_deadline = Some(now.saturating_add(self.debounce));
    }

    /// Called once per animation frame. Returns whether the window should be
    /// recomputed now.
    ///
    /// A frame recompute that lands at or after the trailing deadline also
    /// satisfies the trailing recompute.
    pub fn poll(&mut self, now: Duration) -> bool {
        let trailing_due = self.trailing_deadline.is_some_and(|deadline| now >= deadline);
        if self.frame_pending {
            self.frame_pending = false;
            if trailing_due {
                self.trailing_deadline = None;
            }
            return true;
        }
        if trailing_due {
            self.trailing_deadline = None;
            return true;
        }
        false
    }

    /// Whether any recompute is still owed.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.frame_pending || self.trailing_deadline.is_some()
    }

    /// Scroll events folded into an already pending frame.
    #[must_use]
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    /// Drop any owed recompute.
    pub fn cancel(&mut self) {
        self.frame_pending = false;
        self.trailing_deadline = None;
    }
}
