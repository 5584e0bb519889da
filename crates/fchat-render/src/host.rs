#![forbid(unsafe_code)]

//! The presentation boundary.
//!
//! Renderers never touch a DOM or terminal directly. They issue node
//! operations against a [`RenderHost`] and read geometry back from it.
//! Nodes are opaque [`NodeId`] handles owned by the host.
//!
//! # Node Contract
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | `create_node` | Build a node for a message and append it to the content layer |
//! | `order_nodes` | Move the given nodes, in order, to the end of the content layer |
//! | `measure` | Laid-out height in px, `None` when the host cannot measure yet |
//! | `set_content_offset` | Translate the content layer down by px |
//! | `set_spacer_height` | Size the scrollable area independently of the live nodes |

use std::fmt;

use fchat_core::{Align, LineShape, Message, MsgId};

/// Opaque handle to a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Alternating styling bucket of a visible message.
///
/// Counted over visible messages only, so hiding one message flips the
/// bucket of every visible message after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parity {
    /// Visible ordinals 0, 2, 4, ...
    First,
    /// Visible ordinals 1, 3, 5, ...
    Second,
}

impl Parity {
    #[must_use]
    pub const fn of_ordinal(ordinal: usize) -> Self {
        if ordinal % 2 == 0 {
            Self::First
        } else {
            Self::Second
        }
    }

    /// Class-name suffix used by styled hosts.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::First => "1",
            Self::Second => "2",
        }
    }
}

/// Scroll geometry reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub scroll_top: u32,
    pub client_height: u32,
    pub scroll_height: u32,
}

impl Viewport {
    /// Distance from the bottom edge of the viewport to the end of the content.
    #[must_use]
    pub fn distance_to_bottom(&self) -> u32 {
        self.scroll_height
            .saturating_sub(self.scroll_top.saturating_add(self.client_height))
    }

    /// Largest reachable `scroll_top`.
    #[must_use]
    pub fn max_scroll_top(&self) -> u32 {
        self.scroll_height.saturating_sub(self.client_height)
    }
}

/// Everything a host needs to build a message node.
#[derive(Debug, Clone, Copy)]
pub struct NodeView<'a> {
    pub msgid: MsgId,
    /// Position in the renderer's item sequence.
    pub index: usize,
    pub content: &'a str,
    pub user_string: &'a str,
    pub role: &'a str,
    pub align: Align,
    pub tags: &'a [String],
    pub visible: bool,
    /// `None` when alternating styling is off or the message is hidden.
    pub parity: Option<Parity>,
    pub line_shape: LineShape,
}

impl<'a> NodeView<'a> {
    #[must_use]
    pub fn new(msg: &'a Message, index: usize, parity: Option<Parity>) -> Self {
        Self {
            msgid: msg.msgid,
            index,
            content: &msg.content,
            user_string: &msg.user_string,
            role: &msg.role,
            align: msg.align,
            tags: &msg.tags,
            visible: msg.visible,
            parity,
            line_shape: msg.line_shape(),
        }
    }
}

/// Node operations and geometry a renderer needs from its presentation layer.
pub trait RenderHost {
    /// Build a node for `view` and append it to the content layer.
    fn create_node(&mut self, view: &NodeView<'_>) -> NodeId;

    /// Detach and drop a node. Unknown ids are ignored.
    fn remove_node(&mut self, node: NodeId);

    fn set_content(&mut self, node: NodeId, content: &str);

    fn append_content(&mut self, node: NodeId, text: &str);

    fn set_visible(&mut self, node: NodeId, visible: bool);

    /// Update the item index a node reports.
    fn set_index(&mut self, node: NodeId, index: usize);

    fn set_parity(&mut self, node: NodeId, parity: Option<Parity>);

    /// Move `nodes`, in order, to the end of the content layer.
    fn order_nodes(&mut self, nodes: &[NodeId]);

    /// Laid-out height of a node in px.
    fn measure(&self, node: NodeId) -> Option<u32>;

    fn viewport(&self) -> Viewport;

    fn set_scroll_top(&mut self, px: u32);

    /// Translate the content layer down by `px`.
    fn set_content_offset(&mut self, px: u32);

    /// Size the scrollable area to `px`.
    fn set_spacer_height(&mut self, px: u32);

    /// Drop every node and reset layout.
    fn clear(&mut self);
}
