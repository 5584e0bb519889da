#![forbid(unsafe_code)]

//! Widget configuration.
//!
//! Configuration is an explicit value handed to the widget at construction.
//! Every field is named, has a documented default, and is checked by
//! [`ChatConfig::validate`]. With the `serde` feature, JSON configuration
//! rejects unknown keys instead of merging them.

use std::fmt;
use std::time::Duration;

use crate::history::DEFAULT_HISTORY_LIMIT;

/// Default estimated item height for unmeasured messages, in pixels.
pub const DEFAULT_ITEM_HEIGHT: u32 = 80;
/// Default number of items materialized beyond each viewport edge.
pub const DEFAULT_BUFFER: usize = 5;
/// Default trailing scroll debounce, in milliseconds.
pub const DEFAULT_SCROLL_DEBOUNCE_MS: u64 = 10;
/// Default "near bottom" distance for smart scrolling, in pixels.
pub const DEFAULT_NEAR_BOTTOM_PX: u32 = 100;
/// Default message count at which `Auto` switches to virtual rendering.
pub const DEFAULT_AUTO_THRESHOLD: usize = 1_000;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Invalid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `history_limit` must be at least one.
    ZeroHistoryLimit,
    /// `virtual_scroll.item_height` must be positive.
    ZeroItemHeight,
    /// `Auto` rendering needs a positive threshold.
    ZeroThreshold,
    /// An `Auto` threshold above `history_limit` is never reached, since
    /// retention caps the history at the limit.
    ThresholdAboveLimit { threshold: usize, limit: usize },
    /// The configuration document could not be parsed.
    #[cfg(feature = "serde")]
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroHistoryLimit => f.write_str("history_limit must be at least 1"),
            Self::ZeroItemHeight => f.write_str("virtual_scroll.item_height must be positive"),
            Self::ZeroThreshold => f.write_str("auto render threshold must be positive"),
            Self::ThresholdAboveLimit { threshold, limit } => write!(
                f,
                "auto render threshold {threshold} exceeds history_limit {limit}"
            ),
            #[cfg(feature = "serde")]
            Self::Parse(msg) => write!(f, "config parse error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Renderer selection policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "mode", rename_all = "lowercase"))]
pub enum RenderMode {
    /// One node per message.
    #[default]
    Direct,
    /// Windowed rendering from the first message.
    Virtual,
    /// Direct until the history reaches `threshold` messages, then virtual.
    Auto { threshold: usize },
}

impl RenderMode {
    /// `Auto` with the default threshold.
    #[must_use]
    pub const fn auto() -> Self {
        Self::Auto {
            threshold: DEFAULT_AUTO_THRESHOLD,
        }
    }
}

/// Virtual scroller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct VirtualConfig {
    /// Height assumed for items not yet measured (px). Default 80.
    pub item_height: u32,
    /// Items materialized beyond each viewport edge. Default 5.
    pub buffer: usize,
    /// Trailing recomputation delay after the last scroll event (ms). Default 10.
    pub scroll_debounce_ms: u64,
    /// Smart scroll follows when within this many px of the bottom. Default 100.
    pub near_bottom_px: u32,
}

impl Default for VirtualConfig {
    fn default() -> Self {
        Self {
            item_height: DEFAULT_ITEM_HEIGHT,
            buffer: DEFAULT_BUFFER,
            scroll_debounce_ms: DEFAULT_SCROLL_DEBOUNCE_MS,
            near_bottom_px: DEFAULT_NEAR_BOTTOM_PX,
        }
    }
}

impl VirtualConfig {
    #[must_use]
    pub fn with_item_height(mut self, px: u32) -> Self {
        self.item_height = px;
        self
    }

    #[must_use]
    pub fn with_buffer(mut self, buffer: usize) -> Self {
        self.buffer = buffer;
        self
    }

    #[must_use]
    pub fn with_scroll_debounce_ms(mut self, ms: u64) -> Self {
        self.scroll_debounce_ms = ms;
        self
    }

    #[must_use]
    pub fn with_near_bottom_px(mut self, px: u32) -> Self {
        self.near_bottom_px = px;
        self
    }

    /// Debounce as a duration.
    #[must_use]
    pub fn scroll_debounce(&self) -> Duration {
        Duration::from_millis(self.scroll_debounce_ms)
    }
}

/// Top-level widget configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct ChatConfig {
    /// Maximum retained messages; the oldest is evicted beyond it. Default 10,000,000.
    pub history_limit: usize,
    /// Renderer selection. Default `Direct`.
    pub render_mode: RenderMode,
    /// Virtual scroller tuning.
    pub virtual_scroll: VirtualConfig,
    /// Alternate the styling bucket of consecutive visible messages. Default true.
    pub alternating: bool,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            render_mode: RenderMode::Direct,
            virtual_scroll: VirtualConfig::default(),
            alternating: true,
        }
    }
}

impl ChatConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    #[must_use]
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = mode;
        self
    }

    #[must_use]
    pub fn with_virtual_scroll(mut self, virtual_scroll: VirtualConfig) -> Self {
        self.virtual_scroll = virtual_scroll;
        self
    }

    #[must_use]
    pub fn with_alternating(mut self, alternating: bool) -> Self {
        self.alternating = alternating;
        self
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        if self.virtual_scroll.item_height == 0 {
            return Err(ConfigError::ZeroItemHeight);
        }
        if let RenderMode::Auto { threshold } = self.render_mode {
            if threshold == 0 {
                return Err(ConfigError::ZeroThreshold);
            }
            if threshold > self.history_limit {
                return Err(ConfigError::ThresholdAboveLimit {
                    threshold,
                    limit: self.history_limit,
                });
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration document. Missing fields take
    /// their defaults; unknown fields are rejected.
    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ChatConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.virtual_scroll.item_height, 80);
        assert_eq!(config.virtual_scroll.buffer, 5);
        assert_eq!(config.virtual_scroll.scroll_debounce(), Duration::from_millis(10));
        assert_eq!(config.render_mode, RenderMode::Direct);
    }

    #[test]
    fn validation_rejects_zero_fields() {
        assert_eq!(
            ChatConfig::new().with_history_limit(0).validate(),
            Err(ConfigError::ZeroHistoryLimit)
        );
        assert_eq!(
            ChatConfig::new()
                .with_virtual_scroll(VirtualConfig::default().with_item_height(0))
                .validate(),
            Err(ConfigError::ZeroItemHeight)
        );
        assert_eq!(
            ChatConfig::new()
                .with_render_mode(RenderMode::Auto { threshold: 0 })
                .validate(),
            Err(ConfigError::ZeroThreshold)
        );
    }

    #[test]
    fn auto_threshold_must_be_reachable() {
        let config = ChatConfig::new()
            .with_history_limit(100)
            .with_render_mode(RenderMode::Auto { threshold: 101 });
        assert_eq!(
            config.validate(),
            Err(ConfigError::ThresholdAboveLimit {
                threshold: 101,
                limit: 100
            })
        );
        let at_limit = config.with_render_mode(RenderMode::Auto { threshold: 100 });
        assert_eq!(at_limit.validate(), Ok(()));
        // only Auto is tied to the limit
        let direct = at_limit.with_history_limit(1).with_render_mode(RenderMode::Direct);
        assert_eq!(direct.validate(), Ok(()));
    }

    #[test]
    fn error_messages_name_the_field() {
        assert!(ConfigError::ZeroItemHeight.to_string().contains("item_height"));
        let err = ConfigError::ThresholdAboveLimit {
            threshold: 600,
            limit: 500,
        };
        assert_eq!(err.to_string(), "auto render threshold 600 exceeds history_limit 500");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn json_fills_defaults_and_rejects_unknown_keys() {
        let config = ChatConfig::from_json(
            r#"{"render_mode":{"mode":"auto","threshold":50},"virtual_scroll":{"buffer":2}}"#,
        )
        .unwrap();
        assert_eq!(config.render_mode, RenderMode::Auto { threshold: 50 });
        assert_eq!(config.virtual_scroll.buffer, 2);
        assert_eq!(config.virtual_scroll.item_height, DEFAULT_ITEM_HEIGHT);

        assert!(matches!(
            ChatConfig::from_json(r#"{"colour":"red"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert_eq!(
            ChatConfig::from_json(r#"{"history_limit":0}"#),
            Err(ConfigError::ZeroHistoryLimit)
        );
    }
}
