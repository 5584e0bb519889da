#![forbid(unsafe_code)]

//! Deterministic in-memory [`RenderHost`].
//!
//! Keeps a flat node list plus scroll geometry, and measures nodes with a
//! simple line-wrapping model. Used by tests, benches, and headless embedding.

use rustc_hash::FxHashMap;

use fchat_core::{Align, MsgId};

use crate::host::{NodeId, NodeView, Parity, RenderHost, Viewport};

/// A node as the host sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryNode {
    pub id: NodeId,
    pub msgid: MsgId,
    pub index: usize,
    pub content: String,
    pub user_string: String,
    pub role: String,
    pub align: Align,
    pub visible: bool,
    pub parity: Option<Parity>,
}

/// Height model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Measure {
    /// Every visible node has this height.
    Fixed(u32),
    /// `row_px` per wrapped line at `wrap` chars per line, plus `chrome_px`.
    Lines { row_px: u32, wrap: usize, chrome_px: u32 },
}

/// In-memory host.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    nodes: FxHashMap<NodeId, MemoryNode>,
    order: Vec<NodeId>,
    next_node: u64,
    measure: Measure,
    measurable: bool,
    scroll_top: u32,
    client_height: u32,
    content_offset: u32,
    spacer_height: u32,
    created: u64,
    removed: u64,
}

impl MemoryHost {
    /// Host with a viewport `client_height` px tall and the line-based height model.
    #[must_use]
    pub fn new(client_height: u32) -> Self {
        Self {
            nodes: FxHashMap::default(),
            order: Vec::new(),
            next_node: 1,
            measure: Measure::Lines {
                row_px: 20,
                wrap: 60,
                chrome_px: 24,
            },
            measurable: true,
            scroll_top: 0,
            client_height,
            content_offset: 0,
            spacer_height: 0,
            created: 0,
            removed: 0,
        }
    }

    /// Every visible node measures `px`.
    #[must_use]
    pub fn with_fixed_height(mut self, px: u32) -> Self {
        self.measure = Measure::Fixed(px);
        self
    }

    /// Toggle measurement. While off, `measure` returns `None`.
    pub fn set_measurable(&mut self, measurable: bool) {
        self.measurable = measurable;
    }

    /// Resize the viewport.
    pub fn set_client_height(&mut self, px: u32) {
        self.client_height = px;
        self.scroll_top = self.scroll_top.min(self.viewport().max_scroll_top());
    }

    /// Live nodes in layout order.
    pub fn nodes(&self) -> impl Iterator<Item = &MemoryNode> + '_ {
        self.order.iter().filter_map(|id| self.nodes.get(id))
    }

    /// Owned copy of the live nodes in layout order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<MemoryNode> {
        self.nodes().cloned().collect()
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(&id)
    }

    /// Node displaying `msgid`, if any.
    #[must_use]
    pub fn node_for(&self, msgid: MsgId) -> Option<&MemoryNode> {
        self.nodes().find(|n| n.msgid == msgid)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn content_offset(&self) -> u32 {
        self.content_offset
    }

    #[must_use]
    pub fn spacer_height(&self) -> u32 {
        self.spacer_height
    }

    /// Nodes created since construction.
    #[must_use]
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Nodes removed since construction.
    #[must_use]
    pub fn removed(&self) -> u64 {
        self.removed
    }

    fn height_of(&self, node: &MemoryNode) -> u32 {
        if !node.visible {
            return 0;
        }
        match self.measure {
            Measure::Fixed(px) => px,
            Measure::Lines {
                row_px,
                wrap,
                chrome_px,
            } => {
                let wrap = wrap.max(1);
                let lines: usize = node
                    .content
                    .split('\n')
                    .map(|line| line.chars().count().div_ceil(wrap).max(1))
                    .sum();
                let lines = u32::try_from(lines).unwrap_or(u32::MAX);
                chrome_px.saturating_add(row_px.saturating_mul(lines))
            }
        }
    }

    fn flow_height(&self) -> u32 {
        self.nodes()
            .map(|n| self.height_of(n))
            .fold(self.content_offset, u32::saturating_add)
    }
}

impl RenderHost for MemoryHost {
    fn create_node(&mut self, view: &NodeView<'_>) -> NodeId {
        let id = NodeId(self.next_node);
        self.next_node += 1;
        self.created += 1;
        self.nodes.insert(
            id,
            MemoryNode {
                id,
                msgid: view.msgid,
                index: view.index,
                content: view.content.to_owned(),
                user_string: view.user_string.to_owned(),
                role: view.role.to_owned(),
                align: view.align,
                visible: view.visible,
                parity: view.parity,
            },
        );
        self.order.push(id);
        id
    }

    fn remove_node(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_some() {
            self.order.retain(|&id| id != node);
            self.removed += 1;
        }
    }

    fn set_content(&mut self, node: NodeId, content: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            content.clone_into(&mut n.content);
        }
    }

    fn append_content(&mut self, node: NodeId, text: &str) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.content.push_str(text);
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visible = visible;
        }
    }

    fn set_index(&mut self, node: NodeId, index: usize) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.index = index;
        }
    }

    fn set_parity(&mut self, node: NodeId, parity: Option<Parity>) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.parity = parity;
        }
    }

    fn order_nodes(&mut self, nodes: &[NodeId]) {
        let known: Vec<NodeId> = nodes
            .iter()
            .copied()
            .filter(|id| self.nodes.contains_key(id))
            .collect();
        self.order.retain(|id| !known.contains(id));
        self.order.extend(known);
    }

    fn measure(&self, node: NodeId) -> Option<u32> {
        if !self.measurable {
            return None;
        }
        self.nodes.get(&node).map(|n| self.height_of(n))
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_top: self.scroll_top,
            client_height: self.client_height,
            scroll_height: self.spacer_height.max(self.flow_height()),
        }
    }

    fn set_scroll_top(&mut self, px: u32) {
        self.scroll_top = px.min(self.viewport().max_scroll_top());
    }

    fn set_content_offset(&mut self, px: u32) {
        self.content_offset = px;
    }

    fn set_spacer_height(&mut self, px: u32) {
        self.spacer_height = px;
    }

    fn clear(&mut self) {
        self.removed += self.order.len() as u64;
        self.nodes.clear();
        self.order.clear();
        self.scroll_top = 0;
        self.content_offset = 0;
        self.spacer_height = 0;
    }
}
