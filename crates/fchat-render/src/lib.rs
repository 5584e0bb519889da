#![forbid(unsafe_code)]

//! Message-list renderers.
//!
//! Two strategies share the [`MessageRenderer`] surface:
//!
//! - [`DirectRenderer`]: one node per message, O(n) nodes.
//! - [`VirtualScroller`]: materializes only the window around the viewport.
//!
//! Both talk to the presentation layer through [`RenderHost`]. The
//! [`MemoryHost`] is a deterministic host for tests, benches, and headless use.

pub mod coalescer;
pub mod direct;
pub mod host;
pub mod memory_host;
pub mod virtual_scroller;

pub use coalescer::ScrollCoalescer;
pub use direct::DirectRenderer;
pub use host::{NodeId, NodeView, Parity, RenderHost, Viewport};
pub use memory_host::{MemoryHost, MemoryNode};
pub use virtual_scroller::{ItemPatch, ScrollerPhase, VirtualScroller};

use fchat_core::{Message, MsgId, ScrollIntoView};

/// Add/update/remove surface shared by the direct and virtual renderers.
///
/// Operations on unknown msgids are silent no-ops that return `false`.
pub trait MessageRenderer {
    /// Render a newly appended message and apply its scroll policy.
    fn add(&mut self, host: &mut dyn RenderHost, msg: &Message, scroll: ScrollIntoView);

    /// Replace a message's content.
    fn replace_content(&mut self, host: &mut dyn RenderHost, msgid: MsgId, content: &str) -> bool;

    /// Append to a message's content.
    fn append_content(&mut self, host: &mut dyn RenderHost, msgid: MsgId, text: &str) -> bool;

    /// Show or hide a message.
    fn set_visible(&mut self, host: &mut dyn RenderHost, msgid: MsgId, visible: bool) -> bool;

    /// Show or hide several messages, returning how many were found.
    fn set_visible_many(&mut self, host: &mut dyn RenderHost, msgids: &[MsgId], visible: bool) -> usize {
        let mut found = 0;
        for &msgid in msgids {
            if self.set_visible(host, msgid, visible) {
                found += 1;
            }
        }
        found
    }

    /// Drop a message and its node.
    fn remove(&mut self, host: &mut dyn RenderHost, msgid: MsgId) -> bool;

    /// Drop every message and node.
    fn clear(&mut self, host: &mut dyn RenderHost);

    /// Scroll the container to its end.
    fn scroll_to_bottom(&mut self, host: &mut dyn RenderHost);

    /// Scroll so the message is at the top of the viewport.
    fn scroll_to_message(&mut self, host: &mut dyn RenderHost, msgid: MsgId) -> bool;

    /// Number of live nodes.
    fn rendered_count(&self) -> usize;
}
