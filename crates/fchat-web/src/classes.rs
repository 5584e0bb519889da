#![forbid(unsafe_code)]

//! Class names and attributes applied to message nodes.
//!
//! Kept free of `web-sys` so stylesheet-facing names are checked on native
//! targets.
//!
//! | Class | Meaning |
//! |-------|---------|
//! | `quikchat-message` | Every message node |
//! | `quikchat-message-{left,right,center}` | Alignment bucket |
//! | `quikchat-msgid-0000000042` | Zero-padded msgid lookup class |
//! | `quikchat-message-{1,2}` | Alternating parity, absent when off or hidden |
//! | `quikchat-tag-{tag}` | One per carried tag |
//! | `{align}-{singleline,multiline}` | Content layout bucket |

use fchat::core::{Align, LineShape};
use fchat::{MsgId, NodeView, Parity};

pub const MESSAGE: &str = "quikchat-message";
pub const USER: &str = "quikchat-message-user";
pub const CONTENT: &str = "quikchat-message-content";
pub const SPACER: &str = "virtual-spacer";
pub const CONTENT_LAYER: &str = "virtual-content";

/// Both parity classes, for removal before re-adding one.
pub const PARITY: [&str; 2] = ["quikchat-message-1", "quikchat-message-2"];

/// Every layout-bucket class a node can carry.
pub const SHAPES: [&str; 6] = [
    "left-singleline",
    "left-multiline",
    "right-singleline",
    "right-multiline",
    "center-singleline",
    "center-multiline",
];

#[must_use]
pub fn msgid_class(msgid: MsgId) -> String {
    format!("quikchat-msgid-{msgid:010}")
}

#[must_use]
pub fn align_class(align: Align) -> String {
    format!("{MESSAGE}-{align}")
}

#[must_use]
pub fn parity_class(parity: Parity) -> &'static str {
    match parity {
        Parity::First => PARITY[0],
        Parity::Second => PARITY[1],
    }
}

#[must_use]
pub fn tag_class(tag: &str) -> String {
    format!("quikchat-tag-{tag}")
}

#[must_use]
pub fn shape_class(align: Align, shape: LineShape) -> &'static str {
    let base = match align {
        Align::Left => 0,
        Align::Right => 2,
        Align::Center => 4,
    };
    match shape {
        LineShape::SingleLine => SHAPES[base],
        LineShape::MultiLine => SHAPES[base + 1],
    }
}

/// Space-separated class list for a freshly created node.
#[must_use]
pub fn message_class_name(view: &NodeView<'_>) -> String {
    let mut classes = vec![
        MESSAGE.to_string(),
        align_class(view.align),
        msgid_class(view.msgid),
        shape_class(view.align, view.line_shape).to_string(),
    ];
    if let Some(parity) = view.parity {
        classes.push(parity_class(parity).to_string());
    }
    classes.extend(view.tags.iter().map(|t| tag_class(t)));
    classes.join(" ")
}

/// `data-*` attributes for a freshly created node.
#[must_use]
pub fn data_attributes(view: &NodeView<'_>) -> Vec<(&'static str, String)> {
    let mut attrs = vec![
        ("data-index", view.index.to_string()),
        ("data-msgid", view.msgid.to_string()),
        ("data-role", view.role.to_string()),
    ];
    if !view.tags.is_empty() {
        attrs.push(("data-tags", view.tags.join(",")));
    }
    attrs
}
