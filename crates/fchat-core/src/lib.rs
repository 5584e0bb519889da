#![forbid(unsafe_code)]

//! Core: message records, the history store, pagination/search, tags, and configuration.

pub mod clock;
pub mod config;
pub mod history;
pub mod hooks;
pub mod logging;
pub mod lorem;
pub mod message;
pub mod query;
pub mod sanitize;
pub mod tags;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ChatConfig, ConfigError, RenderMode, VirtualConfig};
pub use history::{Appended, HistoryInfo, HistoryStore, MessageSummary};
pub use hooks::{ChatEvent, EventHooks, HookId};
pub use message::{Align, LineShape, Message, MsgId, NewMessage, ScrollIntoView};
pub use query::{HistoryPage, PageInfo, SearchFilter, SortOrder};
pub use sanitize::{EscapeHtml, FnSanitizer, Identity, Sanitizer};
pub use tags::{InvalidTag, TagRegistry, is_valid_tag};

// Event macros at the crate root, matching the no-op `#[macro_export]` set.
#[cfg(feature = "tracing")]
pub use logging::{debug, trace, warn};
