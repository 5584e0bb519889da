#![forbid(unsafe_code)]

//! The authoritative, ordered, in-memory message log.
//!
//! # Invariants
//!
//! - msgids are strictly increasing in store order; the order never changes.
//! - exactly one record per msgid; removal deletes the record.
//! - order is insertion order, not timestamp order.
//!
//! Because ids are sorted by construction, id lookups binary-search the
//! log instead of scanning it.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | Unknown msgid | `false` / `None`, state untouched |
//! | Out-of-range slice | clamped to the stored range |
//! | Over retention limit | oldest record evicted (FIFO) |

use std::collections::VecDeque;
use std::ops::Range;

use crate::clock::{Clock, SystemClock};
use crate::message::{Message, MsgId, NewMessage};
use crate::query::{self, HistoryPage, SearchFilter, SortOrder};
use crate::tags::{InvalidTag, TagRegistry};

/// Default retention limit.
pub const DEFAULT_HISTORY_LIMIT: usize = 10_000_000;

/// Fixed per-record overhead used by the memory estimate.
const RECORD_OVERHEAD_BYTES: usize = 96;

/// Result of [`HistoryStore::append_evicting`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    pub msgid: MsgId,
    /// The oldest record, if the append pushed the store over its limit.
    pub evicted: Option<Message>,
}

/// Identity of one end of the history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct MessageSummary {
    pub msgid: MsgId,
    pub timestamp: String,
    pub user_string: String,
}

impl From<&Message> for MessageSummary {
    fn from(m: &Message) -> Self {
        Self {
            msgid: m.msgid,
            timestamp: m.timestamp.clone(),
            user_string: m.user_string.clone(),
        }
    }
}

/// Size and shape of the history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct HistoryInfo {
    pub total_messages: usize,
    pub total_pages: usize,
    pub oldest: Option<MessageSummary>,
    pub newest: Option<MessageSummary>,
    /// Approximate bytes held by all records.
    pub estimated_size: usize,
    pub average_message_size: usize,
}

/// Ordered message log with id assignment, retention, and tag bookkeeping.
#[derive(Debug)]
pub struct HistoryStore {
    messages: VecDeque<Message>,
    next_id: MsgId,
    limit: usize,
    tags: TagRegistry,
    clock: Box<dyn Clock>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl HistoryStore {
    /// Create a store keeping at most `limit` records (`0` means one).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            messages: VecDeque::new(),
            next_id: 0,
            limit: limit.max(1),
            tags: TagRegistry::new(),
            clock: Box::new(SystemClock),
        }
    }

    /// Use `clock` for creation and update timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Retention limit.
    #[must_use]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The id the next append will receive.
    #[must_use]
    pub fn next_id(&self) -> MsgId {
        self.next_id
    }

    /// Iterate records in store order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Message> + ExactSizeIterator + '_ {
        self.messages.iter()
    }

    /// Append a record and return its id.
    pub fn append(&mut self, new: NewMessage) -> MsgId {
        self.append_evicting(new).msgid
    }

    /// Append a record, reporting any record evicted by the retention limit.
    ///
    /// A message carrying a currently hidden tag is stored hidden.
    pub fn append_evicting(&mut self, new: NewMessage) -> Appended {
        let msgid = self.next_id;
        self.next_id += 1;

        let clock = &self.clock;
        let mut message = new.into_message(msgid, || clock.now_iso8601());
        if message.visible && self.tags.any_hidden(&message.tags) {
            message.visible = false;
        }
        self.tags.retain(&message.tags);
        self.messages.push_back(message);

        let evicted = if self.messages.len() > self.limit {
            let old = self.messages.pop_front();
            if let Some(old) = &old {
                self.tags.release(&old.tags);
                crate::debug!(msgid = old.msgid, limit = self.limit, "evicted oldest message");
            }
            old
        } else {
            None
        };

        crate::trace!(msgid, len = self.messages.len(), "appended message");
        Appended { msgid, evicted }
    }

    fn position(&self, msgid: MsgId) -> Option<usize> {
        self.messages
            .binary_search_by_key(&msgid, |m| m.msgid)
            .ok()
    }

    /// Array position of `msgid`, if stored.
    #[must_use]
    pub fn index_of(&self, msgid: MsgId) -> Option<usize> {
        self.position(msgid)
    }

    /// Remove and return the record with `msgid`.
    pub fn take(&mut self, msgid: MsgId) -> Option<Message> {
        let pos = self.position(msgid)?;
        let removed = self.messages.remove(pos)?;
        self.tags.release(&removed.tags);
        Some(removed)
    }

    /// Remove the record with `msgid`; `false` if it was not stored.
    pub fn remove(&mut self, msgid: MsgId) -> bool {
        self.take(msgid).is_some()
    }

    /// Remove the record with the highest msgid; `false` when empty.
    pub fn remove_last(&mut self) -> bool {
        self.take_last().is_some()
    }

    /// Remove and return the record with the highest msgid.
    pub fn take_last(&mut self) -> Option<Message> {
        let removed = self.messages.pop_back()?;
        self.tags.release(&removed.tags);
        Some(removed)
    }

    #[must_use]
    pub fn get(&self, msgid: MsgId) -> Option<&Message> {
        self.position(msgid).and_then(|pos| self.messages.get(pos))
    }

    /// Record at array position `index` (not msgid).
    #[must_use]
    pub fn get_at(&self, index: usize) -> Option<&Message> {
        self.messages.get(index)
    }

    #[must_use]
    pub fn content(&self, msgid: MsgId) -> Option<&str> {
        self.get(msgid).map(|m| m.content.as_str())
    }

    fn get_mut(&mut self, msgid: MsgId) -> Option<&mut Message> {
        let pos = self.position(msgid)?;
        self.messages.get_mut(pos)
    }

    /// Append `text` to the content of `msgid`.
    pub fn append_content(&mut self, msgid: MsgId, text: &str) -> bool {
        let now = self.clock.now_iso8601();
        match self.get_mut(msgid) {
            Some(m) => {
                m.content.push_str(text);
                m.updated_time = now;
                true
            }
            None => false,
        }
    }

    /// Replace the content of `msgid`.
    pub fn replace_content(&mut self, msgid: MsgId, text: &str) -> bool {
        let now = self.clock.now_iso8601();
        match self.get_mut(msgid) {
            Some(m) => {
                m.content.clear();
                m.content.push_str(text);
                m.updated_time = now;
                true
            }
            None => false,
        }
    }

    pub fn set_visibility(&mut self, msgid: MsgId, visible: bool) -> bool {
        match self.get_mut(msgid) {
            Some(m) => {
                m.visible = visible;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn visibility(&self, msgid: MsgId) -> Option<bool> {
        self.get(msgid).map(|m| m.visible)
    }

    /// Copy of the records at array positions `range`, clamped.
    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> Vec<Message> {
        let end = range.end.min(self.messages.len());
        let start = range.start.min(end);
        self.messages.range(start..end).cloned().collect()
    }

    /// Copy of the entire history.
    #[must_use]
    pub fn all(&self) -> Vec<Message> {
        self.messages.iter().cloned().collect()
    }

    /// One 1-based page of history.
    #[must_use]
    pub fn page(&self, page: usize, page_size: usize, order: SortOrder) -> HistoryPage {
        query::paginate(&self.messages, page, page_size, order)
    }

    /// Records matching every criterion of `filter`.
    #[must_use]
    pub fn search(&self, filter: &SearchFilter) -> Vec<Message> {
        query::search(&self.messages, filter)
    }

    /// Size, page count, and the oldest/newest records.
    #[must_use]
    pub fn info(&self, page_size: usize) -> HistoryInfo {
        let total = self.messages.len();
        let estimated_size: usize = self.messages.iter().map(estimate_bytes).sum();
        HistoryInfo {
            total_messages: total,
            total_pages: total.div_ceil(page_size.max(1)),
            oldest: self.messages.front().map(MessageSummary::from),
            newest: self.messages.back().map(MessageSummary::from),
            estimated_size,
            average_message_size: if total == 0 { 0 } else { estimated_size / total },
        }
    }

    /// Empty the store and restart ids at zero.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.next_id = 0;
        self.tags.clear_counts();
    }

    /// Replace the history with `messages`, assigning ids from zero.
    pub fn restore_all<I>(&mut self, messages: I) -> Vec<MsgId>
    where
        I: IntoIterator<Item = NewMessage>,
    {
        self.clear();
        messages.into_iter().map(|m| self.append(m)).collect()
    }

    /// Tags carried by at least one stored record, sorted.
    #[must_use]
    pub fn active_tags(&self) -> Vec<String> {
        self.tags.active()
    }

    /// Show or hide every record carrying `tag`, returning the ids whose
    /// visibility changed. Later appends carrying a hidden tag start hidden.
    pub fn set_tag_visibility(&mut self, tag: &str, visible: bool) -> Result<Vec<MsgId>, InvalidTag> {
        self.tags.set_visibility(tag, visible)?;
        let mut changed = Vec::new();
        for m in self.messages.iter_mut().filter(|m| m.has_tag(tag)) {
            if m.visible != visible {
                m.visible = visible;
                changed.push(m.msgid);
            }
        }
        crate::debug!(tag, visible, changed = changed.len(), "tag visibility");
        Ok(changed)
    }

    /// Current visibility of `tag` (tags never hidden are visible).
    pub fn tag_visibility(&self, tag: &str) -> Result<bool, InvalidTag> {
        self.tags.visibility(tag)
    }
}

fn estimate_bytes(m: &Message) -> usize {
    RECORD_OVERHEAD_BYTES
        + m.content.len()
        + m.user_string.len()
        + m.role.len()
        + m.timestamp.len()
        + m.updated_time.len()
        + m.tags.iter().map(String::len).sum::<usize>()
}
