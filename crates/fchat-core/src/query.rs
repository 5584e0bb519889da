#![forbid(unsafe_code)]

//! Read-only pagination and search over the history.
//!
//! Every call recomputes from the current records; nothing is cached
//! between calls. An empty history yields zero pages and no messages.

use std::collections::VecDeque;
use std::fmt;

use crate::message::Message;

/// Default number of search results.
pub const DEFAULT_SEARCH_LIMIT: usize = 100;

/// Default page size.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Page ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// Page 1 holds the oldest messages.
    #[default]
    #[cfg_attr(feature = "serde", serde(rename = "asc"))]
    Ascending,
    /// Page 1 holds the newest messages, newest first.
    #[cfg_attr(feature = "serde", serde(rename = "desc"))]
    Descending,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        })
    }
}

/// Pagination metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct PageInfo {
    /// 1-based page actually returned, clamped to `[1, max(total_pages, 1)]`.
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_messages: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub order: SortOrder,
}

/// One page of history.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HistoryPage {
    pub messages: Vec<Message>,
    pub pagination: PageInfo,
}

/// Conjunctive search criteria. Unset criteria match everything.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct SearchFilter {
    /// Case-insensitive substring of the content.
    pub text: Option<String>,
    /// Exact display name.
    pub user_string: Option<String>,
    /// Exact role.
    pub role: Option<String>,
    /// Matches when the message carries at least one of these tags.
    pub tags: Vec<String>,
    /// Maximum number of results.
    pub limit: usize,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            text: None,
            user_string: None,
            role: None,
            tags: Vec::new(),
            limit: DEFAULT_SEARCH_LIMIT,
        }
    }
}

impl SearchFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    #[must_use]
    pub fn user(mut self, user_string: impl Into<String>) -> Self {
        self.user_string = Some(user_string.into());
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the result limit; `0` falls back to the default.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Whether a single message satisfies every set criterion.
    ///
    /// `needle` is the pre-lowercased text criterion.
    fn matches(&self, msg: &Message, needle: Option<&str>) -> bool {
        if let Some(needle) = needle
            && !msg.content.to_lowercase().contains(needle)
        {
            return false;
        }
        if let Some(user) = self.user_string.as_deref().filter(|u| !u.is_empty())
            && msg.user_string != user
        {
            return false;
        }
        if let Some(role) = self.role.as_deref().filter(|r| !r.is_empty())
            && msg.role != role
        {
            return false;
        }
        if !self.tags.is_empty() && !msg.tags.iter().any(|t| self.tags.contains(t)) {
            return false;
        }
        true
    }
}

/// Slice one page out of `messages`.
///
/// A `page_size` of zero is treated as one.
#[must_use]
pub fn paginate(
    messages: &VecDeque<Message>,
    page: usize,
    page_size: usize,
    order: SortOrder,
) -> HistoryPage {
    let page_size = page_size.max(1);
    let total = messages.len();
    let total_pages = total.div_ceil(page_size);
    let current_page = page.clamp(1, total_pages.max(1));

    let (start, end) = match order {
        SortOrder::Ascending => {
            let start = ((current_page - 1) * page_size).min(total);
            (start, (start + page_size).min(total))
        }
        SortOrder::Descending => {
            let end = total.saturating_sub((current_page - 1) * page_size);
            (end.saturating_sub(page_size), end)
        }
    };

    let mut page_messages: Vec<Message> = messages.range(start..end).cloned().collect();
    if order == SortOrder::Descending {
        page_messages.reverse();
    }

    HistoryPage {
        messages: page_messages,
        pagination: PageInfo {
            current_page,
            page_size,
            total_pages,
            total_messages: total,
            has_next: current_page < total_pages,
            has_previous: current_page > 1,
            order,
        },
    }
}

/// Messages matching every criterion in `filter`, in store order, truncated
/// to the filter's limit.
#[must_use]
pub fn search(messages: &VecDeque<Message>, filter: &SearchFilter) -> Vec<Message> {
    let needle = filter
        .text
        .as_deref()
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase);
    let limit = if filter.limit == 0 {
        DEFAULT_SEARCH_LIMIT
    } else {
        filter.limit
    };
    messages
        .iter()
        .filter(|m| filter.matches(m, needle.as_deref()))
        .take(limit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::NewMessage;
    use pretty_assertions::assert_eq;

    fn store(contents: &[&str]) -> VecDeque<Message> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| NewMessage::new(*c).into_message(i as u64, String::new))
            .collect()
    }

    fn ids(messages: &[Message]) -> Vec<u64> {
        messages.iter().map(|m| m.msgid).collect()
    }

    #[test]
    fn ascending_first_page() {
        let s = store(&["a", "b", "c", "d", "e"]);
        let page = paginate(&s, 1, 2, SortOrder::Ascending);
        assert_eq!(ids(&page.messages), vec![0, 1]);
        assert_eq!(page.pagination.total_pages, 3);
        assert!(page.pagination.has_next);
        assert!(!page.pagination.has_previous);
    }

    #[test]
    fn ascending_last_partial_page() {
        let s = store(&["a", "b", "c", "d", "e"]);
        let page = paginate(&s, 3, 2, SortOrder::Ascending);
        assert_eq!(ids(&page.messages), vec![4]);
        assert!(!page.pagination.has_next);
        assert!(page.pagination.has_previous);
    }

    #[test]
    fn descending_pages_newest_first() {
        let s = store(&["a", "b", "c", "d", "e"]);
        let first = paginate(&s, 1, 2, SortOrder::Descending);
        assert_eq!(ids(&first.messages), vec![4, 3]);
        let last = paginate(&s, 3, 2, SortOrder::Descending);
        assert_eq!(ids(&last.messages), vec![0]);
    }

    #[test]
    fn page_number_is_clamped() {
        let s = store(&["a", "b", "c"]);
        assert_eq!(paginate(&s, 0, 2, SortOrder::Ascending).pagination.current_page, 1);
        let past = paginate(&s, 99, 2, SortOrder::Ascending);
        assert_eq!(past.pagination.current_page, 2);
        assert_eq!(ids(&past.messages), vec![2]);
    }

    #[test]
    fn empty_history_has_no_pages() {
        let s = VecDeque::new();
        let page = paginate(&s, 1, 10, SortOrder::Descending);
        assert!(page.messages.is_empty());
        assert_eq!(
            page.pagination,
            PageInfo {
                current_page: 1,
                page_size: 10,
                total_pages: 0,
                total_messages: 0,
                has_next: false,
                has_previous: false,
                order: SortOrder::Descending,
            }
        );
    }

    #[test]
    fn zero_page_size_is_treated_as_one() {
        let s = store(&["a", "b"]);
        let page = paginate(&s, 2, 0, SortOrder::Ascending);
        assert_eq!(page.pagination.page_size, 1);
        assert_eq!(ids(&page.messages), vec![1]);
    }

    #[test]
    fn search_is_conjunctive_and_case_insensitive() {
        let mut s = store(&["Disk ERROR", "all good", "error again", "fine"]);
        s[0].role = "system".into();
        s[1].role = "system".into();
        s[3].role = "system".into();
        let found = search(&s, &SearchFilter::new().text("error").role("system"));
        assert_eq!(ids(&found), vec![0]);
    }

    #[test]
    fn search_tags_match_any() {
        let mut s = store(&["a", "b", "c"]);
        s[0].tags = vec!["x".into()];
        s[2].tags = vec!["y".into(), "z".into()];
        let found = search(&s, &SearchFilter::new().tag("z").tag("x"));
        assert_eq!(ids(&found), vec![0, 2]);
    }

    #[test]
    fn search_respects_limit_in_store_order() {
        let s = store(&["hit", "hit", "miss", "hit"]);
        let found = search(&s, &SearchFilter::new().text("HIT").limit(2));
        assert_eq!(ids(&found), vec![0, 1]);
    }

    #[test]
    fn empty_filter_matches_everything_up_to_default_limit() {
        let contents: Vec<String> = (0..150).map(|i| format!("m{i}")).collect();
        let refs: Vec<&str> = contents.iter().map(String::as_str).collect();
        let s = store(&refs);
        assert_eq!(search(&s, &SearchFilter::new()).len(), DEFAULT_SEARCH_LIMIT);
    }
}
