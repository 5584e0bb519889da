#![forbid(unsafe_code)]

//! Windowed rendering of large message lists.
//!
//! Only the items intersecting the viewport, plus `buffer` items on each
//! side, have live nodes. A spacer sized to the estimated total height keeps
//! the scrollbar honest, and the content layer is offset by the cumulative
//! height of everything above the window.
//!
//! # Height Model
//!
//! Each item's effective height is its measured height, or the configured
//! estimate until it has been measured. Hidden items count as zero and are
//! never materialized. Nodes created or updated during a pass are measured
//! in [`VirtualScroller::after_paint`], which corrects the height map and the
//! spacer; the estimate is kept whenever the host cannot measure.
//!
//! # Window
//!
//! ```text
//! start = first index whose cumulative end > scroll_top,  minus buffer
//! end   = first index whose cumulative end > scroll_bottom, plus buffer + 1
//! ```
//!
//! Lookups scan from whichever end of the list is nearer, so following the
//! tail of a long conversation costs O(window) rather than O(n).
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Out-of-range index | `false` / no-op |
//! | Host cannot measure | estimate kept, node stays pending |
//! | Viewport past content | last `buffer` items rendered |

use std::collections::BTreeMap;
use std::ops::Range;
use std::time::Duration;

use rustc_hash::FxHashSet;

use fchat_core::{Message, MsgId, ScrollIntoView, VirtualConfig};

use crate::MessageRenderer;
use crate::coalescer::ScrollCoalescer;
use crate::host::{NodeId, NodeView, Parity, RenderHost};

/// Lifecycle of the scroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollerPhase {
    /// No items.
    Idle,
    /// Some live nodes have not been measured yet.
    Measuring,
    /// Every live node has been measured (or measurement was refused).
    Windowed,
}

/// Partial update applied by [`VirtualScroller::update_item`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPatch {
    pub content: Option<String>,
    pub visible: Option<bool>,
}

impl ItemPatch {
    #[must_use]
    pub fn content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            visible: None,
        }
    }

    #[must_use]
    pub fn visible(visible: bool) -> Self {
        Self {
            content: None,
            visible: Some(visible),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    node: NodeId,
    parity: Option<Parity>,
}

/// Windowed renderer keyed by item index.
#[derive(Debug, Clone)]
pub struct VirtualScroller {
    config: VirtualConfig,
    alternating: bool,
    items: Vec<Message>,
    /// Measured heights, parallel to `items`.
    heights: Vec<Option<u32>>,
    /// Sum of effective heights.
    total_height: u64,
    visible_count: usize,
    /// Live nodes keyed by item index.
    rendered: BTreeMap<usize, Slot>,
    /// Nodes awaiting measurement.
    pending: FxHashSet<NodeId>,
    range: Range<usize>,
    coalescer: ScrollCoalescer,
    observing_resize: bool,
}

fn clamp_px(px: u64) -> u32 {
    u32::try_from(px).unwrap_or(u32::MAX)
}

impl VirtualScroller {
    #[must_use]
    pub fn new(config: VirtualConfig, alternating: bool) -> Self {
        Self {
            coalescer: ScrollCoalescer::new(config.scroll_debounce()),
            config,
            alternating,
            items: Vec::new(),
            heights: Vec::new(),
            total_height: 0,
            visible_count: 0,
            rendered: BTreeMap::new(),
            pending: FxHashSet::default(),
            range: 0..0,
            observing_resize: true,
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &VirtualConfig {
        &self.config
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Every item, in order.
    #[must_use]
    pub fn items(&self) -> &[Message] {
        &self.items
    }

    /// Items inside the current window, hidden ones included.
    #[must_use]
    pub fn visible_items(&self) -> &[Message] {
        &self.items[self.range.clone()]
    }

    /// Current window `[start, end)`.
    #[must_use]
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// Indices with a live node, ascending.
    #[must_use]
    pub fn rendered_indices(&self) -> Vec<usize> {
        self.rendered.keys().copied().collect()
    }

    /// Live node for the item at `index`.
    #[must_use]
    pub fn node_at(&self, index: usize) -> Option<NodeId> {
        self.rendered.get(&index).map(|s| s.node)
    }

    /// Estimated scrollable height in px.
    #[must_use]
    pub fn total_height(&self) -> u64 {
        self.total_height
    }

    /// Effective height of the item at `index`.
    #[must_use]
    pub fn height_at(&self, index: usize) -> Option<u32> {
        (index < self.items.len()).then(|| self.effective_height(index))
    }

    /// Measured height of the item at `index`, if it has been measured.
    #[must_use]
    pub fn measured_height(&self, index: usize) -> Option<u32> {
        self.heights.get(index).copied().flatten()
    }

    #[must_use]
    pub fn phase(&self) -> ScrollerPhase {
        if self.items.is_empty() {
            ScrollerPhase::Idle
        } else if !self.pending.is_empty() {
            ScrollerPhase::Measuring
        } else {
            ScrollerPhase::Windowed
        }
    }

    /// Index of the item with `msgid`.
    #[must_use]
    pub fn find_index_by_msgid(&self, msgid: MsgId) -> Option<usize> {
        self.items
            .binary_search_by_key(&msgid, |m| m.msgid)
            .ok()
            .or_else(|| self.items.iter().position(|m| m.msgid == msgid))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Height bookkeeping
    // ─────────────────────────────────────────────────────────────────────

    fn effective_height(&self, index: usize) -> u32 {
        if !self.items[index].visible {
            return 0;
        }
        self.heights[index].unwrap_or(self.config.item_height)
    }

    /// Replace the effective height contribution `before` with that of `index`.
    fn rebalance(&mut self, index: usize, before: u32) {
        let after = self.effective_height(index);
        self.total_height = self.total_height - u64::from(before) + u64::from(after);
    }

    /// Smallest index whose cumulative end exceeds `px`.
    fn locate(&self, px: u64) -> Option<usize> {
        if px >= self.total_height {
            return None;
        }
        if px < self.total_height / 2 {
            let mut acc = 0u64;
            for i in 0..self.items.len() {
                acc += u64::from(self.effective_height(i));
                if acc > px {
                    return Some(i);
                }
            }
            None
        } else {
            let mut cum_end = self.total_height;
            let mut found = None;
            for i in (0..self.items.len()).rev() {
                if cum_end <= px {
                    break;
                }
                found = Some(i);
                cum_end -= u64::from(self.effective_height(i));
            }
            found
        }
    }

    /// Cumulative height of items before `index`.
    fn offset_before(&self, index: usize) -> u64 {
        let n = self.items.len();
        let index = index.min(n);
        if index <= n / 2 {
            (0..index).map(|i| u64::from(self.effective_height(i))).sum()
        } else {
            let below: u64 = (index..n).map(|i| u64::from(self.effective_height(i))).sum();
            self.total_height - below
        }
    }

    fn visible_before(&self, index: usize) -> usize {
        let n = self.items.len();
        if index <= n / 2 {
            self.items[..index].iter().filter(|m| m.visible).count()
        } else {
            self.visible_count - self.items[index..].iter().filter(|m| m.visible).count()
        }
    }

    fn update_spacer(&self, host: &mut dyn RenderHost) {
        host.set_spacer_height(clamp_px(self.total_height));
    }

    fn is_near_bottom(&self, host: &dyn RenderHost) -> bool {
        let vp = host.viewport();
        let seen = u64::from(vp.scroll_top) + u64::from(vp.client_height);
        self.total_height <= seen + u64::from(self.config.near_bottom_px)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Windowing
    // ─────────────────────────────────────────────────────────────────────

    fn compute_range(&self, scroll_top: u32, client_height: u32) -> Range<usize> {
        let n = self.items.len();
        let buffer = self.config.buffer;
        let top = u64::from(scroll_top);
        let bottom = top + u64::from(client_height);

        let start = self
            .locate(top)
            .map_or(n.saturating_sub(buffer), |i| i.saturating_sub(buffer));
        let end = self
            .locate(bottom)
            .map_or(n, |i| i.saturating_add(buffer).saturating_add(1).min(n));
        start.min(end)..end
    }

    /// Recompute the window from the host viewport and reconcile nodes.
    fn refresh(&mut self, host: &mut dyn RenderHost) {
        let vp = host.viewport();
        self.range = self.compute_range(vp.scroll_top, vp.client_height);
        self.render_window(host);
    }

    fn drop_slot(&mut self, host: &mut dyn RenderHost, slot: Slot) {
        self.pending.remove(&slot.node);
        host.remove_node(slot.node);
    }

    fn render_window(&mut self, host: &mut dyn RenderHost) {
        let Range { start, end } = self.range.clone();

        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("virtual_render", start, end, len = self.items.len())
            .entered();

        let mut inside = self.rendered.split_off(&start);
        let above = std::mem::take(&mut self.rendered);
        let below = inside.split_off(&end);
        self.rendered = inside;
        for slot in above.into_values().chain(below.into_values()) {
            self.drop_slot(host, slot);
        }

        let mut ordinal = if self.alternating {
            self.visible_before(start)
        } else {
            0
        };
        let mut created = false;
        for index in start..end {
            if !self.items[index].visible {
                if let Some(slot) = self.rendered.remove(&index) {
                    self.drop_slot(host, slot);
                }
                continue;
            }
            let parity = self.alternating.then(|| Parity::of_ordinal(ordinal));
            ordinal += 1;

            match self.rendered.get_mut(&index) {
                Some(slot) => {
                    if slot.parity != parity {
                        slot.parity = parity;
                        host.set_parity(slot.node, parity);
                    }
                }
                None => {
                    let node = host.create_node(&NodeView::new(&self.items[index], index, parity));
                    self.rendered.insert(index, Slot { node, parity });
                    self.pending.insert(node);
                    created = true;
                }
            }
        }

        host.set_content_offset(clamp_px(self.offset_before(start)));
        if created {
            let order: Vec<NodeId> = self.rendered.values().map(|s| s.node).collect();
            host.order_nodes(&order);
        }
        fchat_core::trace!(start, end, live = self.rendered.len(), "window reconciled");
    }

    /// Measure nodes created or updated since the last paint. Returns whether
    /// any height changed.
    pub fn after_paint(&mut self, host: &mut dyn RenderHost) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        let mut changed = false;
        let mut retry = FxHashSet::default();
        for (&index, slot) in &self.rendered {
            if !self.pending.contains(&slot.node) {
                continue;
            }
            match host.measure(slot.node) {
                Some(h) if h > 0 => {
                    let old = self.heights[index].unwrap_or(self.config.item_height);
                    self.heights[index] = Some(h);
                    if old != h {
                        self.total_height = self.total_height - u64::from(old) + u64::from(h);
                        changed = true;
                    }
                }
                Some(_) => {}
                None => {
                    retry.insert(slot.node);
                }
            }
        }
        self.pending = retry;
        if changed {
            self.update_spacer(host);
            fchat_core::debug!(total = self.total_height, "height map corrected");
        }
        changed
    }

    // ─────────────────────────────────────────────────────────────────────
    // Operations
    // ─────────────────────────────────────────────────────────────────────

    /// Append an item and apply its scroll policy. Returns its index.
    pub fn add_item(
        &mut self,
        host: &mut dyn RenderHost,
        item: Message,
        scroll: ScrollIntoView,
    ) -> usize {
        let near_bottom = self.is_near_bottom(host);
        let index = self.items.len();
        if item.visible {
            self.visible_count += 1;
        }
        self.items.push(item);
        self.heights.push(None);
        self.total_height += u64::from(self.effective_height(index));
        self.update_spacer(host);

        if index >= self.range.start && index <= self.range.end {
            self.refresh(host);
        }
        match scroll {
            ScrollIntoView::Always => self.scroll_to_bottom(host),
            ScrollIntoView::Smart if near_bottom => self.scroll_to_bottom(host),
            _ => {}
        }
        index
    }

    /// Replace the whole item list and re-render.
    pub fn set_items(&mut self, host: &mut dyn RenderHost, items: Vec<Message>) {
        for (_, slot) in std::mem::take(&mut self.rendered) {
            self.drop_slot(host, slot);
        }
        self.heights = vec![None; items.len()];
        self.items = items;
        self.visible_count = self.items.iter().filter(|m| m.visible).count();
        self.total_height = (0..self.items.len())
            .map(|i| u64::from(self.effective_height(i)))
            .sum();
        self.update_spacer(host);
        self.refresh(host);
    }

    /// Patch the item at `index`. A live node is updated in place and
    /// re-measured; a visibility change re-renders the window.
    pub fn update_item(&mut self, host: &mut dyn RenderHost, index: usize, patch: ItemPatch) -> bool {
        if index >= self.items.len() {
            return false;
        }
        let before = self.effective_height(index);
        let slot = self.rendered.get(&index).copied();

        if let Some(content) = patch.content {
            if let Some(slot) = slot {
                host.set_content(slot.node, &content);
                self.pending.insert(slot.node);
            }
            self.items[index].content = content;
        }

        self.rebalance(index, before);
        let reshaped = patch
            .visible
            .is_some_and(|visible| self.apply_visibility(index, visible));
        if reshaped {
            self.update_spacer(host);
            self.refresh(host);
        }
        true
    }

    /// Flip visibility without re-rendering. Returns whether it changed.
    fn apply_visibility(&mut self, index: usize, visible: bool) -> bool {
        if self.items[index].visible == visible {
            return false;
        }
        let before = self.effective_height(index);
        self.items[index].visible = visible;
        if visible {
            self.visible_count += 1;
        } else {
            self.visible_count -= 1;
        }
        self.rebalance(index, before);
        true
    }

    /// Append `text` to the item at `index`.
    pub fn append_to_item(&mut self, host: &mut dyn RenderHost, index: usize, text: &str) -> bool {
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };
        item.content.push_str(text);
        if let Some(slot) = self.rendered.get(&index) {
            host.append_content(slot.node, text);
            self.pending.insert(slot.node);
        }
        true
    }

    /// Remove the item at `index`, renumbering every later live node.
    pub fn remove_item(&mut self, host: &mut dyn RenderHost, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        self.total_height -= u64::from(self.effective_height(index));
        if self.items[index].visible {
            self.visible_count -= 1;
        }
        self.items.remove(index);
        self.heights.remove(index);

        if let Some(slot) = self.rendered.remove(&index) {
            self.drop_slot(host, slot);
        }
        let later = self.rendered.split_off(&index);
        for (i, slot) in later {
            host.set_index(slot.node, i - 1);
            self.rendered.insert(i - 1, slot);
        }

        self.update_spacer(host);
        self.refresh(host);
        true
    }

    /// Scroll to the end and re-render.
    pub fn scroll_to_bottom(&mut self, host: &mut dyn RenderHost) {
        let client = u64::from(host.viewport().client_height);
        host.set_scroll_top(clamp_px(self.total_height.saturating_sub(client)));
        self.refresh(host);
    }

    /// Scroll so the item at `index` is at the top of the viewport.
    pub fn scroll_to_item(&mut self, host: &mut dyn RenderHost, index: usize) -> bool {
        if index >= self.items.len() {
            return false;
        }
        host.set_scroll_top(clamp_px(self.offset_before(index)));
        self.refresh(host);
        true
    }

    /// Recompute the window now.
    pub fn force_update(&mut self, host: &mut dyn RenderHost) {
        self.refresh(host);
    }

    /// Drop every item and node.
    pub fn clear(&mut self, host: &mut dyn RenderHost) {
        for (_, slot) in std::mem::take(&mut self.rendered) {
            host.remove_node(slot.node);
        }
        self.items.clear();
        self.heights.clear();
        self.pending.clear();
        self.total_height = 0;
        self.visible_count = 0;
        self.range = 0..0;
        self.coalescer.cancel();
        host.set_spacer_height(0);
        host.set_content_offset(0);
    }

    /// Clear, empty the host, and stop reacting to resizes.
    pub fn destroy(&mut self, host: &mut dyn RenderHost) {
        self.clear(host);
        host.clear();
        self.observing_resize = false;
    }

    // ─────────────────────────────────────────────────────────────────────
    // Host events
    // ─────────────────────────────────────────────────────────────────────

    /// A scroll event arrived at `now`. Work is deferred to [`Self::on_frame`].
    pub fn on_scroll(&mut self, now: Duration) {
        self.coalescer.on_scroll(now);
    }

    /// The viewport was resized.
    pub fn on_resize(&mut self, host: &mut dyn RenderHost) {
        if self.observing_resize {
            self.refresh(host);
        }
    }

    /// Animation frame at `now`: run any owed scroll recompute, then measure.
    /// A corrected height map recomputes the window, so nodes that measured
    /// smaller than the estimate do not leave the viewport partly empty; the
    /// nodes this creates are measured on a later frame. Returns whether
    /// anything changed.
    pub fn on_frame(&mut self, host: &mut dyn RenderHost, now: Duration) -> bool {
        let recomputed = self.coalescer.poll(now);
        if recomputed {
            self.refresh(host);
        }
        let measured = self.after_paint(host);
        if measured {
            self.refresh(host);
        }
        recomputed || measured
    }
}

impl MessageRenderer for VirtualScroller {
    fn add(&mut self, host: &mut dyn RenderHost, msg: &Message, scroll: ScrollIntoView) {
        self.add_item(host, msg.clone(), scroll);
    }

    fn replace_content(&mut self, host: &mut dyn RenderHost, msgid: MsgId, content: &str) -> bool {
        self.find_index_by_msgid(msgid)
            .is_some_and(|i| self.update_item(host, i, ItemPatch::content(content)))
    }

    fn append_content(&mut self, host: &mut dyn RenderHost, msgid: MsgId, text: &str) -> bool {
        self.find_index_by_msgid(msgid)
            .is_some_and(|i| self.append_to_item(host, i, text))
    }

    fn set_visible(&mut self, host: &mut dyn RenderHost, msgid: MsgId, visible: bool) -> bool {
        self.find_index_by_msgid(msgid)
            .is_some_and(|i| self.update_item(host, i, ItemPatch::visible(visible)))
    }

    fn set_visible_many(&mut self, host: &mut dyn RenderHost, msgids: &[MsgId], visible: bool) -> usize {
        let mut found = 0;
        let mut reshaped = false;
        for &msgid in msgids {
            if let Some(i) = self.find_index_by_msgid(msgid) {
                found += 1;
                reshaped |= self.apply_visibility(i, visible);
            }
        }
        if reshaped {
            self.update_spacer(host);
            self.refresh(host);
        }
        found
    }

    fn remove(&mut self, host: &mut dyn RenderHost, msgid: MsgId) -> bool {
        self.find_index_by_msgid(msgid)
            .is_some_and(|i| self.remove_item(host, i))
    }

    fn clear(&mut self, host: &mut dyn RenderHost) {
        VirtualScroller::clear(self, host);
    }

    fn scroll_to_bottom(&mut self, host: &mut dyn RenderHost) {
        VirtualScroller::scroll_to_bottom(self, host);
    }

    fn scroll_to_message(&mut self, host: &mut dyn RenderHost, msgid: MsgId) -> bool {
        self.find_index_by_msgid(msgid)
            .is_some_and(|i| self.scroll_to_item(host, i))
    }

    fn rendered_count(&self) -> usize {
        self.rendered.len()
    }
}
