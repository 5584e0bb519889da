#![forbid(unsafe_code)]

//! Message records and the input used to create them.

use std::fmt;

use crate::tags::is_valid_tag;

/// Message identifier, assigned by the history store at append time.
pub type MsgId = u64;

/// Content longer than this (in chars) is treated as multi-line for layout.
pub const SINGLE_LINE_MAX_CHARS: usize = 50;

/// Horizontal placement bucket for a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Align {
    Left,
    #[default]
    Right,
    Center,
}

impl Align {
    /// Lowercase name, as used in host class names.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Center => "center",
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Auto-scroll policy applied when a message is added.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ScrollIntoView {
    /// Always jump to the bottom.
    #[default]
    Always,
    /// Jump only if the viewport was already near the bottom.
    Smart,
    /// Never scroll.
    Never,
}

/// Layout bucket derived from message content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineShape {
    SingleLine,
    MultiLine,
}

impl LineShape {
    /// Classify content: multi-line if it has a newline or is long.
    #[must_use]
    pub fn of(content: &str) -> Self {
        if content.contains('\n') || content.chars().count() > SINGLE_LINE_MAX_CHARS {
            Self::MultiLine
        } else {
            Self::SingleLine
        }
    }
}

/// One chat message's full state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Message {
    pub msgid: MsgId,
    pub content: String,
    pub user_string: String,
    pub align: Align,
    pub role: String,
    #[cfg_attr(feature = "serde", serde(rename = "userID"))]
    pub user_id: i64,
    pub timestamp: String,
    #[cfg_attr(feature = "serde", serde(rename = "updatedtime"))]
    pub updated_time: String,
    pub visible: bool,
    pub tags: Vec<String>,
}

impl Message {
    /// Whether this message carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Layout bucket for this message's content.
    #[must_use]
    pub fn line_shape(&self) -> LineShape {
        LineShape::of(&self.content)
    }

    /// Convert back into creation input, keeping timestamps.
    ///
    /// Used to restore a saved history: the store assigns fresh ids.
    #[must_use]
    pub fn to_new(&self) -> NewMessage {
        NewMessage {
            content: self.content.clone(),
            user_string: self.user_string.clone(),
            align: self.align,
            role: self.role.clone(),
            user_id: self.user_id,
            timestamp: Some(self.timestamp.clone()),
            updated_time: Some(self.updated_time.clone()),
            scroll: ScrollIntoView::Never,
            visible: self.visible,
            tags: self.tags.clone(),
        }
    }
}

/// Input for creating a message.
///
/// Defaults: empty content, user `"user"`, right-aligned, role `"user"`,
/// user id `-1`, always scroll, visible, no tags.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct NewMessage {
    pub content: String,
    pub user_string: String,
    pub align: Align,
    pub role: String,
    #[cfg_attr(feature = "serde", serde(rename = "userID"))]
    pub user_id: i64,
    pub timestamp: Option<String>,
    #[cfg_attr(feature = "serde", serde(rename = "updatedtime"))]
    pub updated_time: Option<String>,
    #[cfg_attr(feature = "serde", serde(rename = "scrollIntoView"))]
    pub scroll: ScrollIntoView,
    pub visible: bool,
    pub tags: Vec<String>,
}

impl Default for NewMessage {
    fn default() -> Self {
        Self {
            content: String::new(),
            user_string: "user".to_string(),
            align: Align::Right,
            role: "user".to_string(),
            user_id: -1,
            timestamp: None,
            updated_time: None,
            scroll: ScrollIntoView::Always,
            visible: true,
            tags: Vec::new(),
        }
    }
}

impl NewMessage {
    /// Create input with the given content and default metadata.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn user(mut self, user_string: impl Into<String>) -> Self {
        self.user_string = user_string.into();
        self
    }

    #[must_use]
    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    #[must_use]
    pub fn user_id(mut self, user_id: i64) -> Self {
        self.user_id = user_id;
        self
    }

    /// Use a caller-supplied creation timestamp instead of "now".
    #[must_use]
    pub fn timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    #[must_use]
    pub fn updated_time(mut self, updated_time: impl Into<String>) -> Self {
        self.updated_time = Some(updated_time.into());
        self
    }

    #[must_use]
    pub fn scroll(mut self, scroll: ScrollIntoView) -> Self {
        self.scroll = scroll;
        self
    }

    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Add a tag. Invalid tags are dropped when the message is stored.
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    #[must_use]
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    /// Build the stored record. `now` supplies the creation time when the
    /// input carries none.
    pub(crate) fn into_message(self, msgid: MsgId, now: impl FnOnce() -> String) -> Message {
        let timestamp = self.timestamp.unwrap_or_else(now);
        let updated_time = self.updated_time.unwrap_or_else(|| timestamp.clone());
        Message {
            msgid,
            content: self.content,
            user_string: self.user_string,
            align: self.align,
            role: self.role,
            user_id: self.user_id,
            timestamp,
            updated_time,
            visible: self.visible,
            tags: normalize_tags(self.tags),
        }
    }
}

/// Drop invalid tags and duplicates, keeping first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !is_valid_tag(&tag) {
            crate::debug!(tag = %tag, "dropping invalid tag");
            continue;
        }
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}
