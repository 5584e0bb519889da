#![forbid(unsafe_code)]

//! fchat public facade crate.
//!
//! Re-exports the message model, history, and renderers, and provides
//! [`ChatWidget`], which keeps a history store and the active renderer in
//! step behind one msgid-keyed API.

use std::fmt;

pub mod widget;

pub use widget::{ActiveRenderer, ChatWidget, VersionInfo};

// --- Core re-exports -------------------------------------------------------

pub use fchat_core::lorem::lorem_ipsum;
pub use fchat_core::{
    Align, ChatConfig, ChatEvent, Clock, ConfigError, EscapeHtml, FnSanitizer, HistoryInfo,
    HistoryPage, HookId, Identity, InvalidTag, ManualClock, Message, MessageSummary, MsgId,
    NewMessage, PageInfo, RenderMode, Sanitizer, ScrollIntoView, SearchFilter, SortOrder,
    SystemClock, VirtualConfig,
};

// --- Render re-exports -----------------------------------------------------

pub use fchat_render::{
    MemoryHost, MessageRenderer, NodeId, NodeView, Parity, RenderHost, ScrollerPhase, Viewport,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for fchat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The configuration failed validation.
    Config(ConfigError),
    /// A tag did not match `[A-Za-z0-9-]+`.
    InvalidTag(InvalidTag),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::InvalidTag(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::InvalidTag(err) => Some(err),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl From<InvalidTag> for Error {
    fn from(err: InvalidTag) -> Self {
        Self::InvalidTag(err)
    }
}

/// Standard result type for fchat APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        Align, ChatConfig, ChatEvent, ChatWidget, Error, MemoryHost, Message, MsgId, NewMessage,
        RenderHost, RenderMode, Result, ScrollIntoView, SearchFilter, SortOrder, VirtualConfig,
    };

    pub use crate::{core, render};
}

pub use fchat_core as core;
pub use fchat_render as render;
