#![forbid(unsafe_code)]

//! Tag validation, the set of tags present in the history, and per-tag
//! visibility overrides.

use std::collections::BTreeMap;
use std::fmt;

/// Whether `tag` is a non-empty run of ASCII letters, digits, and hyphens.
#[must_use]
pub fn is_valid_tag(tag: &str) -> bool {
    !tag.is_empty() && tag.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
}

/// A tag name that is not alphanumeric-and-hyphen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidTag(pub String);

impl fmt::Display for InvalidTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid tag name: {:?}", self.0)
    }
}

impl std::error::Error for InvalidTag {}

fn check(tag: &str) -> Result<(), InvalidTag> {
    if is_valid_tag(tag) {
        Ok(())
    } else {
        Err(InvalidTag(tag.to_string()))
    }
}

/// Reference counts of tags carried by stored messages, plus visibility
/// overrides set through [`TagRegistry::set_visibility`].
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    counts: BTreeMap<String, usize>,
    hidden: BTreeMap<String, bool>,
}

impl TagRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more message carrying each of `tags`.
    pub fn retain<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            *self.counts.entry(tag.clone()).or_insert(0) += 1;
        }
    }

    /// Count one fewer message carrying each of `tags`; a tag with no
    /// remaining carriers is no longer active.
    pub fn release<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            if let Some(count) = self.counts.get_mut(tag.as_str()) {
                *count = count.saturating_sub(1);
                if *count == 0 {
                    self.counts.remove(tag.as_str());
                }
            }
        }
    }

    /// Tags carried by at least one stored message, sorted.
    #[must_use]
    pub fn active(&self) -> Vec<String> {
        self.counts.keys().cloned().collect()
    }

    /// Number of stored messages carrying `tag`.
    #[must_use]
    pub fn count(&self, tag: &str) -> usize {
        self.counts.get(tag).copied().unwrap_or(0)
    }

    /// Record the visibility state for `tag`.
    pub fn set_visibility(&mut self, tag: &str, visible: bool) -> Result<(), InvalidTag> {
        check(tag)?;
        self.hidden.insert(tag.to_string(), !visible);
        Ok(())
    }

    /// Current visibility for `tag`; tags never set are visible.
    pub fn visibility(&self, tag: &str) -> Result<bool, InvalidTag> {
        check(tag)?;
        Ok(!self.hidden.get(tag).copied().unwrap_or(false))
    }

    /// Whether any of `tags` is currently hidden.
    #[must_use]
    pub fn any_hidden<'a>(&self, tags: impl IntoIterator<Item = &'a String>) -> bool {
        tags.into_iter()
            .any(|t| self.hidden.get(t.as_str()).copied().unwrap_or(false))
    }

    /// Forget counts. Visibility overrides survive, like the host's CSS
    /// state survives a history clear.
    pub fn clear_counts(&mut self) {
        self.counts.clear();
    }
}
