#![forbid(unsafe_code)]

//! The chat widget.
//!
//! [`ChatWidget`] owns the history store, the active renderer, the event
//! hooks, and the content sanitizer, and keeps them consistent: every
//! mutation commits to the history first, then updates the renderer, then
//! notifies subscribers.
//!
//! # Renderer Selection
//!
//! | `RenderMode` | Renderer |
//! |--------------|----------|
//! | `Direct` | [`DirectRenderer`] for the widget's lifetime |
//! | `Virtual` | [`VirtualScroller`] from the first message |
//! | `Auto { threshold }` | direct until the history reaches `threshold`, then virtual |
//!
//! Migration happens once, just before the append that reaches the
//! threshold, and is not reversed when the history shrinks again.

use std::fmt;
use std::ops::Range;
use std::time::Duration;

use fchat_core::query::DEFAULT_PAGE_SIZE;
use fchat_core::{
    Align, Appended, ChatConfig, ChatEvent, Clock, EventHooks, HistoryInfo, HistoryPage,
    HistoryStore, HookId, Identity, Message, MsgId, NewMessage, RenderMode, Sanitizer,
    ScrollIntoView, SearchFilter, SortOrder,
};
use fchat_render::{DirectRenderer, MessageRenderer, RenderHost, VirtualScroller};

/// Which renderer is currently driving the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveRenderer {
    Direct,
    Virtual,
}

/// Package identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo {
    pub name: &'static str,
    pub version: &'static str,
    pub license: &'static str,
}

impl VersionInfo {
    #[must_use]
    pub const fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            license: env!("CARGO_PKG_LICENSE"),
        }
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.license)
    }
}

#[derive(Debug)]
enum Renderer {
    Direct(DirectRenderer),
    Virtual(VirtualScroller),
}

impl Renderer {
    fn as_dyn(&mut self) -> &mut dyn MessageRenderer {
        match self {
            Self::Direct(r) => r,
            Self::Virtual(s) => s,
        }
    }

    fn kind(&self) -> ActiveRenderer {
        match self {
            Self::Direct(_) => ActiveRenderer::Direct,
            Self::Virtual(_) => ActiveRenderer::Virtual,
        }
    }
}

/// A message list bound to a render host.
#[derive(Debug)]
pub struct ChatWidget<H: RenderHost> {
    config: ChatConfig,
    history: HistoryStore,
    host: H,
    renderer: Renderer,
    hooks: EventHooks,
    sanitizer: Box<dyn Sanitizer>,
}

impl<H: RenderHost> ChatWidget<H> {
    /// Validate `config` and bind a widget to `host`.
    pub fn new(config: ChatConfig, host: H) -> crate::Result<Self> {
        config.validate()?;
        let renderer = match config.render_mode {
            RenderMode::Virtual => Renderer::Virtual(VirtualScroller::new(
                config.virtual_scroll,
                config.alternating,
            )),
            RenderMode::Direct | RenderMode::Auto { .. } => Renderer::Direct(DirectRenderer::new(
                config.alternating,
                config.virtual_scroll.near_bottom_px,
            )),
        };
        fchat_core::debug!(mode = ?config.render_mode, "chat widget created");
        Ok(Self {
            history: HistoryStore::new(config.history_limit),
            config,
            host,
            renderer,
            hooks: EventHooks::new(),
            sanitizer: Box::new(Identity),
        })
    }

    /// Use `clock` for message timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.history = std::mem::take(&mut self.history).with_clock(clock);
        self
    }

    /// Run every added or updated content string through `sanitizer`.
    #[must_use]
    pub fn with_sanitizer(mut self, sanitizer: impl Sanitizer + 'static) -> Self {
        self.set_sanitizer(sanitizer);
        self
    }

    /// Swap the sanitizer. Already stored content is left as is.
    pub fn set_sanitizer(&mut self, sanitizer: impl Sanitizer + 'static) {
        self.sanitizer = Box::new(sanitizer);
    }

    /// Package identity.
    #[must_use]
    pub const fn version() -> VersionInfo {
        VersionInfo::current()
    }

    // ─────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Give the host back.
    #[must_use]
    pub fn into_host(self) -> H {
        self.host
    }

    #[must_use]
    pub fn active_renderer(&self) -> ActiveRenderer {
        self.renderer.kind()
    }

    /// The virtual scroller, when it is the active renderer.
    #[must_use]
    pub fn scroller(&self) -> Option<&VirtualScroller> {
        match &self.renderer {
            Renderer::Virtual(s) => Some(s),
            Renderer::Direct(_) => None,
        }
    }

    /// Number of live nodes in the host.
    #[must_use]
    pub fn rendered_count(&self) -> usize {
        match &self.renderer {
            Renderer::Direct(r) => r.rendered_count(),
            Renderer::Virtual(s) => s.rendered_count(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Messages
    // ─────────────────────────────────────────────────────────────────────

    /// Add a message with the common fields and defaults for the rest.
    pub fn message_add(
        &mut self,
        content: &str,
        user_string: &str,
        align: Align,
        role: &str,
    ) -> MsgId {
        self.message_add_new(
            NewMessage::new(content)
                .user(user_string)
                .align(align)
                .role(role),
        )
    }

    /// Add a fully specified message.
    pub fn message_add_new(&mut self, mut new: NewMessage) -> MsgId {
        new.content = self.sanitizer.sanitize(&new.content);
        self.push(new)
    }

    /// Store and render `new` as given. Content must already be sanitized.
    fn push(&mut self, new: NewMessage) -> MsgId {
        let upcoming = (self.history.len() + 1).min(self.history.limit());
        self.migrate_if_needed(upcoming);

        let scroll = new.scroll;
        let Appended { msgid, evicted } = self.history.append_evicting(new);
        if let Some(old) = evicted {
            self.renderer.as_dyn().remove(&mut self.host, old.msgid);
        }
        if let Some(msg) = self.history.get(msgid) {
            self.renderer.as_dyn().add(&mut self.host, msg, scroll);
        }
        fchat_core::debug!(msgid, len = self.history.len(), "message added");
        self.hooks.emit(&ChatEvent::Added { msgid });
        msgid
    }

    fn migrate_if_needed(&mut self, upcoming_len: usize) {
        let RenderMode::Auto { threshold } = self.config.render_mode else {
            return;
        };
        if upcoming_len < threshold {
            return;
        }
        let Renderer::Direct(direct) = &mut self.renderer else {
            return;
        };
        direct.clear(&mut self.host);

        let mut scroller = VirtualScroller::new(self.config.virtual_scroll, self.config.alternating);
        scroller.set_items(&mut self.host, self.history.all());
        scroller.scroll_to_bottom(&mut self.host);
        self.renderer = Renderer::Virtual(scroller);
        fchat_core::debug!(threshold, len = self.history.len(), "switched to virtual rendering");
    }

    /// Remove a message. `false` if it does not exist.
    pub fn message_remove(&mut self, msgid: MsgId) -> bool {
        if !self.history.remove(msgid) {
            return false;
        }
        self.renderer.as_dyn().remove(&mut self.host, msgid);
        self.hooks.emit(&ChatEvent::Deleted { msgid });
        true
    }

    /// Remove the newest message. `false` when empty.
    pub fn message_remove_last(&mut self) -> bool {
        let Some(last) = self.history.take_last() else {
            return false;
        };
        let msgid = last.msgid;
        self.renderer.as_dyn().remove(&mut self.host, msgid);
        self.hooks.emit(&ChatEvent::Deleted { msgid });
        true
    }

    #[must_use]
    pub fn message_get(&self, msgid: MsgId) -> Option<&Message> {
        self.history.get(msgid)
    }

    #[must_use]
    pub fn message_content(&self, msgid: MsgId) -> Option<&str> {
        self.history.content(msgid)
    }

    /// Append to a message (streaming responses).
    pub fn message_append_content(&mut self, msgid: MsgId, text: &str) -> bool {
        let text = self.sanitizer.sanitize(text);
        if !self.history.append_content(msgid, &text) {
            return false;
        }
        self.renderer
            .as_dyn()
            .append_content(&mut self.host, msgid, &text);
        self.hooks.emit(&ChatEvent::Appended {
            msgid,
            content: text,
        });
        true
    }

    /// Replace a message's content.
    pub fn message_replace_content(&mut self, msgid: MsgId, content: &str) -> bool {
        let content = self.sanitizer.sanitize(content);
        if !self.history.replace_content(msgid, &content) {
            return false;
        }
        self.renderer
            .as_dyn()
            .replace_content(&mut self.host, msgid, &content);
        self.hooks.emit(&ChatEvent::Replaced { msgid, content });
        true
    }

    pub fn message_set_visibility(&mut self, msgid: MsgId, visible: bool) -> bool {
        if !self.history.set_visibility(msgid, visible) {
            return false;
        }
        self.renderer
            .as_dyn()
            .set_visible(&mut self.host, msgid, visible);
        true
    }

    #[must_use]
    pub fn message_visibility(&self, msgid: MsgId) -> Option<bool> {
        self.history.visibility(msgid)
    }

    pub fn message_scroll_to_bottom(&mut self) {
        self.renderer.as_dyn().scroll_to_bottom(&mut self.host);
    }

    /// Scroll so `msgid` is at the top of the viewport.
    pub fn message_scroll_to(&mut self, msgid: MsgId) -> bool {
        self.renderer
            .as_dyn()
            .scroll_to_message(&mut self.host, msgid)
    }

    // ─────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────

    #[must_use]
    pub fn history_count(&self) -> usize {
        self.history.len()
    }

    /// Copies of the messages at array positions `range`, clamped.
    #[must_use]
    pub fn history_get(&self, range: Range<usize>) -> Vec<Message> {
        self.history.slice(range)
    }

    /// Message at array position `index`.
    #[must_use]
    pub fn history_get_message(&self, index: usize) -> Option<&Message> {
        self.history.get_at(index)
    }

    #[must_use]
    pub fn history_get_page(&self, page: usize, page_size: usize, order: SortOrder) -> HistoryPage {
        self.history.page(page, page_size, order)
    }

    #[must_use]
    pub fn history_search(&self, filter: &SearchFilter) -> Vec<Message> {
        self.history.search(filter)
    }

    /// Size summary, with page counts for the default page size.
    #[must_use]
    pub fn history_info(&self) -> HistoryInfo {
        self.history.info(DEFAULT_PAGE_SIZE)
    }

    #[must_use]
    pub fn history_all(&self) -> Vec<Message> {
        self.history.all()
    }

    /// Drop every message and node. No events are emitted.
    pub fn history_clear(&mut self) {
        self.history.clear();
        self.renderer.as_dyn().clear(&mut self.host);
    }

    /// Replace the history with `messages`, as saved by [`Self::history_all`].
    ///
    /// Ids are reassigned from zero; content, order, timestamps, and tags are
    /// kept. Content was sanitized when it was first added and is stored as
    /// given. Each restored message emits `Added`.
    pub fn history_restore_all<I>(&mut self, messages: I) -> Vec<MsgId>
    where
        I: IntoIterator<Item = NewMessage>,
    {
        self.history_clear();
        let ids: Vec<MsgId> = messages
            .into_iter()
            .map(|m| self.push(m.scroll(ScrollIntoView::Never)))
            .collect();
        self.message_scroll_to_bottom();
        fchat_core::debug!(restored = ids.len(), "history restored");
        ids
    }

    // ─────────────────────────────────────────────────────────────────────
    // Tags
    // ─────────────────────────────────────────────────────────────────────

    /// Tags carried by at least one message, sorted.
    #[must_use]
    pub fn active_tags(&self) -> Vec<String> {
        self.history.active_tags()
    }

    /// Show or hide every message carrying `tag`, returning the ids whose
    /// visibility changed.
    pub fn try_set_tag_visibility(&mut self, tag: &str, visible: bool) -> crate::Result<Vec<MsgId>> {
        let changed = self.history.set_tag_visibility(tag, visible)?;
        self.renderer
            .as_dyn()
            .set_visible_many(&mut self.host, &changed, visible);
        Ok(changed)
    }

    /// Show or hide every message carrying `tag`. `false` for an invalid tag.
    pub fn set_tag_visibility(&mut self, tag: &str, visible: bool) -> bool {
        match self.try_set_tag_visibility(tag, visible) {
            Ok(_) => true,
            Err(err) => {
                fchat_core::debug!(%err, "tag visibility rejected");
                false
            }
        }
    }

    /// Whether messages carrying `tag` are shown. `false` for an invalid tag.
    #[must_use]
    pub fn tag_visibility(&self, tag: &str) -> bool {
        self.history.tag_visibility(tag).unwrap_or(false)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Hooks
    // ─────────────────────────────────────────────────────────────────────

    /// Register `handler` for every committed change. Handlers run in
    /// subscription order.
    pub fn subscribe(&mut self, handler: impl FnMut(&ChatEvent) + 'static) -> HookId {
        self.hooks.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: HookId) -> bool {
        self.hooks.unsubscribe(id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Host events
    // ─────────────────────────────────────────────────────────────────────

    /// The host container scrolled at `now` (monotonic).
    pub fn on_scroll(&mut self, now: Duration) {
        if let Renderer::Virtual(s) = &mut self.renderer {
            s.on_scroll(now);
        }
    }

    /// The host container changed size.
    pub fn on_resize(&mut self) {
        if let Renderer::Virtual(s) = &mut self.renderer {
            s.on_resize(&mut self.host);
        }
    }

    /// Animation frame at `now`. Returns whether the window or heights changed.
    pub fn on_frame(&mut self, now: Duration) -> bool {
        match &mut self.renderer {
            Renderer::Virtual(s) => s.on_frame(&mut self.host, now),
            Renderer::Direct(_) => false,
        }
    }

    /// Recompute the virtual window immediately.
    pub fn force_update(&mut self) {
        if let Renderer::Virtual(s) = &mut self.renderer {
            s.force_update(&mut self.host);
        }
    }

    /// Tear down: drop every node, empty the host, and unsubscribe all hooks.
    /// The history is kept.
    pub fn destroy(&mut self) {
        match &mut self.renderer {
            Renderer::Virtual(s) => s.destroy(&mut self.host),
            Renderer::Direct(r) => {
                r.clear(&mut self.host);
                self.host.clear();
            }
        }
        self.hooks = EventHooks::new();
    }
}
