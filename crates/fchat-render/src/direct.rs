#![forbid(unsafe_code)]

//! One node per message.
//!
//! The simplest renderer: every message in the history has a live node in
//! insertion order. Suitable below a few thousand messages; past that, node
//! count dominates layout cost and the [`VirtualScroller`](crate::VirtualScroller)
//! takes over.

use fchat_core::{Message, MsgId, ScrollIntoView};

use crate::MessageRenderer;
use crate::host::{NodeId, NodeView, Parity, RenderHost};

#[derive(Debug, Clone, Copy)]
struct Entry {
    msgid: MsgId,
    node: NodeId,
    visible: bool,
    parity: Option<Parity>,
}

/// Renders every message.
///
/// Entries stay sorted by msgid because the history assigns ids in
/// increasing order, so lookups are binary searches.
#[derive(Debug, Clone)]
pub struct DirectRenderer {
    entries: Vec<Entry>,
    alternating: bool,
    near_bottom_px: u32,
}

impl DirectRenderer {
    #[must_use]
    pub fn new(alternating: bool, near_bottom_px: u32) -> Self {
        Self {
            entries: Vec::new(),
            alternating,
            near_bottom_px,
        }
    }

    fn position(&self, msgid: MsgId) -> Option<usize> {
        self.entries.binary_search_by_key(&msgid, |e| e.msgid).ok()
    }

    /// Node displaying `msgid`.
    #[must_use]
    pub fn node_of(&self, msgid: MsgId) -> Option<NodeId> {
        self.position(msgid).map(|i| self.entries[i].node)
    }

    fn is_near_bottom(&self, host: &dyn RenderHost) -> bool {
        host.viewport().distance_to_bottom() <= self.near_bottom_px
    }

    /// Recompute alternating buckets over visible entries, touching only nodes
    /// whose bucket changed.
    fn restripe(&mut self, host: &mut dyn RenderHost) {
        if !self.alternating {
            return;
        }
        let mut ordinal = 0;
        for entry in &mut self.entries {
            let parity = if entry.visible {
                let p = Parity::of_ordinal(ordinal);
                ordinal += 1;
                Some(p)
            } else {
                None
            };
            if entry.parity != parity {
                entry.parity = parity;
                host.set_parity(entry.node, parity);
            }
        }
    }
}

impl MessageRenderer for DirectRenderer {
    fn add(&mut self, host: &mut dyn RenderHost, msg: &Message, scroll: ScrollIntoView) {
        let near_bottom = self.is_near_bottom(host);

        let parity = (self.alternating && msg.visible).then(|| {
            let ordinal = self.entries.iter().filter(|e| e.visible).count();
            Parity::of_ordinal(ordinal)
        });
        let node = host.create_node(&NodeView::new(msg, self.entries.len(), parity));
        self.entries.push(Entry {
            msgid: msg.msgid,
            node,
            visible: msg.visible,
            parity,
        });

        match scroll {
            ScrollIntoView::Always => self.scroll_to_bottom(host),
            ScrollIntoView::Smart if near_bottom => self.scroll_to_bottom(host),
            _ => {}
        }
    }

    fn replace_content(&mut self, host: &mut dyn RenderHost, msgid: MsgId, content: &str) -> bool {
        let Some(node) = self.node_of(msgid) else {
            return false;
        };
        host.set_content(node, content);
        true
    }

    fn append_content(&mut self, host: &mut dyn RenderHost, msgid: MsgId, text: &str) -> bool {
        let Some(node) = self.node_of(msgid) else {
            return false;
        };
        host.append_content(node, text);
        true
    }

    fn set_visible(&mut self, host: &mut dyn RenderHost, msgid: MsgId, visible: bool) -> bool {
        let Some(i) = self.position(msgid) else {
            return false;
        };
        let entry = &mut self.entries[i];
        if entry.visible != visible {
            entry.visible = visible;
            host.set_visible(entry.node, visible);
            self.restripe(host);
        }
        true
    }

    fn remove(&mut self, host: &mut dyn RenderHost, msgid: MsgId) -> bool {
        let Some(i) = self.position(msgid) else {
            return false;
        };
        let entry = self.entries.remove(i);
        host.remove_node(entry.node);
        for (index, e) in self.entries.iter().enumerate().skip(i) {
            host.set_index(e.node, index);
        }
        self.restripe(host);
        true
    }

    fn clear(&mut self, host: &mut dyn RenderHost) {
        for entry in self.entries.drain(..) {
            host.remove_node(entry.node);
        }
    }

    fn scroll_to_bottom(&mut self, host: &mut dyn RenderHost) {
        let max = host.viewport().max_scroll_top();
        host.set_scroll_top(max);
    }

    fn scroll_to_message(&mut self, host: &mut dyn RenderHost, msgid: MsgId) -> bool {
        let Some(i) = self.position(msgid) else {
            return false;
        };
        let offset = self.entries[..i]
            .iter()
            .filter_map(|e| host.measure(e.node))
            .fold(0u32, u32::saturating_add);
        host.set_scroll_top(offset);
        true
    }

    fn rendered_count(&self) -> usize {
        self.entries.len()
    }
}
