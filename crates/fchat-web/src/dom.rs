#![forbid(unsafe_code)]

//! [`RenderHost`] over a live DOM container.
//!
//! The container gets two children: an absolutely positioned spacer that
//! sizes the scrollable area, and a content layer that holds the live
//! message nodes and is translated down by the content offset.
//!
//! ```text
//! container (overflow: auto)
//! ├── div.virtual-spacer    height = spacer px
//! └── div.virtual-content   transform = translateY(offset px)
//!     └── div.quikchat-message ...
//! ```
//!
//! DOM calls that throw are logged and skipped; the [`RenderHost`] surface is
//! infallible.

use fchat::core::LineShape;
use fchat::{NodeId, NodeView, Parity, RenderHost, Viewport};
use rustc_hash::FxHashMap;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, HtmlElement};

use crate::WebChatError;
use crate::classes;

#[derive(Debug)]
struct DomNode {
    root: HtmlElement,
    content: Element,
    align: fchat::Align,
    visible: bool,
}

/// DOM-backed render host.
#[derive(Debug)]
pub struct DomHost {
    document: Document,
    container: HtmlElement,
    spacer: HtmlElement,
    layer: HtmlElement,
    nodes: FxHashMap<NodeId, DomNode>,
    next_id: u64,
}

fn px(value: u32) -> String {
    format!("{value}px")
}

fn clamp_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

fn non_negative(value: i32) -> u32 {
    u32::try_from(value).unwrap_or(0)
}

fn create_div(document: &Document) -> Result<HtmlElement, JsValue> {
    document
        .create_element("div")?
        .dyn_into::<HtmlElement>()
        .map_err(JsValue::from)
}

impl DomHost {
    /// Take over `container`. Its existing children are removed; its classes
    /// are kept.
    pub fn new(container: HtmlElement) -> Result<Self, WebChatError> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or(WebChatError::NoDocument)?;
        Self::with_document(document, container).map_err(dom_error)
    }

    fn with_document(document: Document, container: HtmlElement) -> Result<Self, JsValue> {
        container.set_inner_html("");
        let style = container.style();
        style.set_property("position", "relative")?;
        style.set_property("overflow", "auto")?;

        let spacer = create_div(&document)?;
        spacer.set_class_name(classes::SPACER);
        spacer.style().set_css_text(
            "position: absolute; top: 0; left: 0; width: 1px; pointer-events: none; z-index: -1;",
        );

        let layer = create_div(&document)?;
        layer.set_class_name(classes::CONTENT_LAYER);
        layer.style().set_css_text("position: relative; width: 100%;");

        container.append_child(&spacer)?;
        container.append_child(&layer)?;

        Ok(Self {
            document,
            container,
            spacer,
            layer,
            nodes: FxHashMap::default(),
            next_id: 0,
        })
    }

    /// The scroll container passed to [`DomHost::new`].
    #[must_use]
    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// Number of live message nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn build(&self, view: &NodeView<'_>) -> Result<DomNode, JsValue> {
        let root = create_div(&self.document)?;
        root.set_class_name(&classes::message_class_name(view));
        for (name, value) in classes::data_attributes(view) {
            root.set_attribute(name, &value)?;
        }

        let user = create_div(&self.document)?;
        user.set_class_name(classes::USER);
        user.set_text_content(Some(view.user_string));

        let content = self.document.create_element("div")?;
        content.set_class_name(classes::CONTENT);
        content.set_inner_html(view.content);

        root.append_child(&user)?;
        root.append_child(&content)?;
        if !view.visible {
            root.style().set_property("display", "none")?;
        }
        self.layer.append_child(&root)?;

        Ok(DomNode {
            root,
            content,
            align: view.align,
            visible: view.visible,
        })
    }
}

fn dom_error(err: JsValue) -> WebChatError {
    WebChatError::Dom(format!("{err:?}"))
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_failure(op: &'static str, result: Result<(), JsValue>) {
    if let Err(err) = result {
        fchat::core::warn!(op, error = ?err, "DOM operation failed");
    }
}

impl DomNode {
    fn reshape(&self) -> Result<(), JsValue> {
        let list = self.root.class_list();
        for class in classes::SHAPES {
            list.remove_1(class)?;
        }
        let shape = LineShape::of(&self.content.inner_html());
        list.add_1(classes::shape_class(self.align, shape))
    }
}

impl RenderHost for DomHost {
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    fn create_node(&mut self, view: &NodeView<'_>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        match self.build(view) {
            Ok(node) => {
                self.nodes.insert(id, node);
            }
            Err(err) => {
                fchat::core::warn!(msgid = view.msgid, error = ?err, "failed to build message node");
            }
        }
        id
    }

    fn remove_node(&mut self, node: NodeId) {
        if let Some(dom) = self.nodes.remove(&node) {
            dom.root.remove();
        }
    }

    fn set_content(&mut self, node: NodeId, content: &str) {
        if let Some(dom) = self.nodes.get(&node) {
            dom.content.set_inner_html(content);
            log_failure("set_content", dom.reshape());
        }
    }

    fn append_content(&mut self, node: NodeId, text: &str) {
        if let Some(dom) = self.nodes.get(&node) {
            let result = dom
                .content
                .insert_adjacent_html("beforeend", text)
                .and_then(|()| dom.reshape());
            log_failure("append_content", result);
        }
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(dom) = self.nodes.get_mut(&node) {
            dom.visible = visible;
            let style = dom.root.style();
            let result = if visible {
                style.remove_property("display").map(drop)
            } else {
                style.set_property("display", "none")
            };
            log_failure("set_visible", result);
        }
    }

    fn set_index(&mut self, node: NodeId, index: usize) {
        if let Some(dom) = self.nodes.get(&node) {
            log_failure(
                "set_index",
                dom.root.set_attribute("data-index", &index.to_string()),
            );
        }
    }

    fn set_parity(&mut self, node: NodeId, parity: Option<Parity>) {
        if let Some(dom) = self.nodes.get(&node) {
            let list = dom.root.class_list();
            let mut result = list.remove_2(classes::PARITY[0], classes::PARITY[1]);
            if let Some(parity) = parity {
                result = result.and_then(|()| list.add_1(classes::parity_class(parity)));
            }
            log_failure("set_parity", result);
        }
    }

    fn order_nodes(&mut self, nodes: &[NodeId]) {
        for id in nodes {
            if let Some(dom) = self.nodes.get(id) {
                log_failure("order_nodes", self.layer.append_child(&dom.root).map(drop));
            }
        }
    }

    fn measure(&self, node: NodeId) -> Option<u32> {
        let Some(dom) = self.nodes.get(&node) else {
            return Some(0);
        };
        if !dom.visible {
            return Some(0);
        }
        // A visible node reporting zero height has not been laid out yet.
        match dom.root.offset_height() {
            h if h > 0 => Some(non_negative(h)),
            _ => None,
        }
    }

    fn viewport(&self) -> Viewport {
        Viewport {
            scroll_top: non_negative(self.container.scroll_top()),
            client_height: non_negative(self.container.client_height()),
            scroll_height: non_negative(self.container.scroll_height()),
        }
    }

    fn set_scroll_top(&mut self, px: u32) {
        self.container.set_scroll_top(clamp_i32(px));
    }

    fn set_content_offset(&mut self, offset: u32) {
        let value = format!("translateY({})", px(offset));
        log_failure(
            "set_content_offset",
            self.layer.style().set_property("transform", &value),
        );
    }

    fn set_spacer_height(&mut self, height: u32) {
        log_failure(
            "set_spacer_height",
            self.spacer.style().set_property("height", &px(height)),
        );
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.layer.set_inner_html("");
        let result = self
            .layer
            .style()
            .remove_property("transform")
            .map(drop)
            .and_then(|()| self.spacer.style().set_property("height", "0px"));
        log_failure("clear", result);
    }
}
