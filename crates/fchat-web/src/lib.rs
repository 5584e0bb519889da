#![forbid(unsafe_code)]

//! Browser frontend for fchat.
//!
//! On `wasm32` this crate provides `DomHost`, a [`fchat::RenderHost`] over a
//! real container element, and `WebChat`, the `wasm-bindgen` export that
//! wraps a [`fchat::ChatWidget`] for JavaScript callers.
//!
//! Native builds compile the error type and class-name tables only.

use std::fmt;

pub mod classes;

#[cfg(target_arch = "wasm32")]
mod dom;
#[cfg(target_arch = "wasm32")]
mod wasm;

#[cfg(target_arch = "wasm32")]
pub use dom::DomHost;
#[cfg(target_arch = "wasm32")]
pub use wasm::WebChat;

/// Native builds compile this crate as a stub so `cargo check --workspace` stays green on non-wasm targets.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
pub struct WebChat;

#[cfg(not(target_arch = "wasm32"))]
impl WebChat {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Failures surfaced to JavaScript callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebChatError {
    /// No `window.document` in this context (e.g. a worker).
    NoDocument,
    /// A DOM call threw. Carries the rendered JS exception.
    Dom(String),
    /// Widget construction or a tag operation was rejected.
    Widget(fchat::Error),
    /// An options or filter object could not be converted.
    Json(String),
}

impl fmt::Display for WebChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDocument => f.write_str("no document available"),
            Self::Dom(msg) => write!(f, "DOM error: {msg}"),
            Self::Widget(err) => write!(f, "{err}"),
            Self::Json(msg) => write!(f, "invalid JSON: {msg}"),
        }
    }
}

impl std::error::Error for WebChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Widget(err) => Some(err),
            _ => None,
        }
    }
}

impl From<fchat::Error> for WebChatError {
    fn from(err: fchat::Error) -> Self {
        Self::Widget(err)
    }
}

impl From<fchat::ConfigError> for WebChatError {
    fn from(err: fchat::ConfigError) -> Self {
        Self::Widget(err.into())
    }
}

impl From<serde_json::Error> for WebChatError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Payload handed to JavaScript event listeners.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload<'a> {
    pub kind: &'static str,
    pub msgid: fchat::MsgId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<&'a str>,
}

impl<'a> From<&'a fchat::ChatEvent> for EventPayload<'a> {
    fn from(event: &'a fchat::ChatEvent) -> Self {
        use fchat::ChatEvent;
        match event {
            ChatEvent::Added { msgid } => Self {
                kind: "added",
                msgid: *msgid,
                content: None,
            },
            ChatEvent::Appended { msgid, content } => Self {
                kind: "appended",
                msgid: *msgid,
                content: Some(content.as_str()),
            },
            ChatEvent::Replaced { msgid, content } => Self {
                kind: "replaced",
                msgid: *msgid,
                content: Some(content.as_str()),
            },
            ChatEvent::Deleted { msgid } => Self {
                kind: "deleted",
                msgid: *msgid,
                content: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fchat::{ChatEvent, ConfigError};
    use pretty_assertions::assert_eq;

    #[test]
    fn error_display_and_source() {
        let err = WebChatError::from(ConfigError::ZeroHistoryLimit);
        assert_eq!(err.to_string(), "history_limit must be at least 1");
        assert!(std::error::Error::source(&err).is_some());

        assert_eq!(WebChatError::NoDocument.to_string(), "no document available");
        assert!(std::error::Error::source(&WebChatError::NoDocument).is_none());
    }

    #[test]
    fn json_errors_convert() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(WebChatError::from(parse), WebChatError::Json(_)));
    }

    #[test]
    fn event_payload_serializes_camel_case() {
        let added = ChatEvent::Added { msgid: 7 };
        assert_eq!(
            serde_json::to_string(&EventPayload::from(&added)).unwrap(),
            r#"{"kind":"added","msgid":7}"#
        );

        let appended = ChatEvent::Appended {
            msgid: 2,
            content: "more".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&EventPayload::from(&appended)).unwrap(),
            r#"{"kind":"appended","msgid":2,"content":"more"}"#
        );
    }

    #[test]
    fn native_stub_constructs() {
        let _ = WebChat::new();
        let _ = WebChat::default();
    }
}
