#![forbid(unsafe_code)]

use fchat::{
    ActiveRenderer, ChatConfig, ChatWidget, EscapeHtml, FnSanitizer, HookId, Identity, MsgId,
    NewMessage, Sanitizer, SearchFilter, SortOrder,
};
use js_sys::{Array, Function, JSON};
use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::prelude::*;
use web_sys::HtmlElement;
use web_time::Instant;

use crate::{DomHost, EventPayload, WebChatError};

impl From<WebChatError> for JsValue {
    fn from(err: WebChatError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

impl From<JsValue> for WebChatError {
    fn from(err: JsValue) -> Self {
        Self::Dom(format!("{err:?}"))
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let json = serde_json::to_string(value).map_err(WebChatError::from)?;
    JSON::parse(&json)
}

fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, WebChatError> {
    let json: String = JSON::stringify(value)?.into();
    Ok(serde_json::from_str(&json)?)
}

/// JS numbers carry msgids; anything that is not a non-negative integer
/// matches nothing.
fn msgid(value: f64) -> Option<MsgId> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then_some(value as MsgId)
}

/// Chat message list bound to a container element.
///
/// The embedding page forwards `scroll`, `resize`, and animation-frame
/// callbacks to [`WebChat::on_scroll`], [`WebChat::on_resize`], and
/// [`WebChat::on_frame`].
#[wasm_bindgen]
pub struct WebChat {
    widget: ChatWidget<DomHost>,
    epoch: Instant,
    hooks: Vec<Option<HookId>>,
}

#[wasm_bindgen]
impl WebChat {
    /// Bind to `container`. `options` is a `ChatConfig` object in its JSON
    /// shape; `undefined` or `null` selects the defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(container: HtmlElement, options: JsValue) -> Result<WebChat, JsValue> {
        let config = if options.is_undefined() || options.is_null() {
            ChatConfig::default()
        } else {
            let json: String = JSON::stringify(&options)?.into();
            ChatConfig::from_json(&json).map_err(WebChatError::from)?
        };
        let host = DomHost::new(container)?;
        let widget = ChatWidget::new(config, host).map_err(WebChatError::from)?;
        Ok(Self {
            widget,
            epoch: Instant::now(),
            hooks: Vec::new(),
        })
    }

    pub fn version() -> String {
        ChatWidget::<DomHost>::version().to_string()
    }

    /// `"direct"` or `"virtual"`.
    #[wasm_bindgen(js_name = rendererKind)]
    pub fn renderer_kind(&self) -> String {
        match self.widget.active_renderer() {
            ActiveRenderer::Direct => "direct".to_string(),
            ActiveRenderer::Virtual => "virtual".to_string(),
        }
    }

    #[wasm_bindgen(js_name = renderedCount)]
    pub fn rendered_count(&self) -> usize {
        self.widget.rendered_count()
    }

    // ── Sanitizer ───────────────────────────────────────────────────────

    /// Escape HTML metacharacters in all future content.
    #[wasm_bindgen(js_name = useHtmlEscaping)]
    pub fn use_html_escaping(&mut self, enabled: bool) {
        if enabled {
            self.widget.set_sanitizer(EscapeHtml);
        } else {
            self.widget.set_sanitizer(Identity);
        }
    }

    /// Route all future content through `sanitize(text) -> string`. A call
    /// that throws or returns a non-string falls back to HTML escaping.
    #[wasm_bindgen(js_name = setSanitizer)]
    pub fn set_sanitizer(&mut self, sanitize: Function) {
        self.widget.set_sanitizer(FnSanitizer(move |text: &str| {
            sanitize
                .call1(&JsValue::NULL, &JsValue::from_str(text))
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_else(|| EscapeHtml.sanitize(text))
        }));
    }

    // ── Messages ────────────────────────────────────────────────────────

    /// Add a message. `align` is `"left"`, `"right"`, or `"center"`.
    #[wasm_bindgen(js_name = messageAddNew)]
    pub fn message_add_new(
        &mut self,
        content: &str,
        user_string: &str,
        align: &str,
        role: &str,
    ) -> Result<f64, JsValue> {
        let align = serde_json::from_value(serde_json::Value::String(align.to_string()))
            .map_err(WebChatError::from)?;
        let new = NewMessage::new(content)
            .user(user_string)
            .align(align)
            .role(role);
        Ok(self.widget.message_add_new(new) as f64)
    }

    /// Add a message from a full input object (`content`, `userString`,
    /// `align`, `role`, `userID`, `timestamp`, `updatedtime`,
    /// `scrollIntoView`, `visible`, `tags`).
    #[wasm_bindgen(js_name = messageAddFull)]
    pub fn message_add_full(&mut self, input: JsValue) -> Result<f64, JsValue> {
        let new: NewMessage = from_js(&input)?;
        Ok(self.widget.message_add_new(new) as f64)
    }

    #[wasm_bindgen(js_name = messageRemove)]
    pub fn message_remove(&mut self, id: f64) -> bool {
        msgid(id).is_some_and(|id| self.widget.message_remove(id))
    }

    #[wasm_bindgen(js_name = messageRemoveLast)]
    pub fn message_remove_last(&mut self) -> bool {
        self.widget.message_remove_last()
    }

    /// The stored record, or `undefined`.
    #[wasm_bindgen(js_name = messageGet)]
    pub fn message_get(&self, id: f64) -> Result<JsValue, JsValue> {
        match msgid(id).and_then(|id| self.widget.message_get(id)) {
            Some(message) => to_js(message),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = messageGetContent)]
    pub fn message_get_content(&self, id: f64) -> Option<String> {
        msgid(id)
            .and_then(|id| self.widget.message_content(id))
            .map(str::to_string)
    }

    #[wasm_bindgen(js_name = messageAppendContent)]
    pub fn message_append_content(&mut self, id: f64, text: &str) -> bool {
        msgid(id).is_some_and(|id| self.widget.message_append_content(id, text))
    }

    #[wasm_bindgen(js_name = messageReplaceContent)]
    pub fn message_replace_content(&mut self, id: f64, content: &str) -> bool {
        msgid(id).is_some_and(|id| self.widget.message_replace_content(id, content))
    }

    #[wasm_bindgen(js_name = messageSetVisibility)]
    pub fn message_set_visibility(&mut self, id: f64, visible: bool) -> bool {
        msgid(id).is_some_and(|id| self.widget.message_set_visibility(id, visible))
    }

    #[wasm_bindgen(js_name = messageGetVisibility)]
    pub fn message_get_visibility(&self, id: f64) -> Option<bool> {
        msgid(id).and_then(|id| self.widget.message_visibility(id))
    }

    #[wasm_bindgen(js_name = messageScrollToBottom)]
    pub fn message_scroll_to_bottom(&mut self) {
        self.widget.message_scroll_to_bottom();
    }

    #[wasm_bindgen(js_name = messageScrollTo)]
    pub fn message_scroll_to(&mut self, id: f64) -> bool {
        msgid(id).is_some_and(|id| self.widget.message_scroll_to(id))
    }

    // ── History ─────────────────────────────────────────────────────────

    #[wasm_bindgen(js_name = historyGetLength)]
    pub fn history_get_length(&self) -> usize {
        self.widget.history_count()
    }

    /// Records `[start, end)` by array position, clamped.
    #[wasm_bindgen(js_name = historyGet)]
    pub fn history_get(&self, start: usize, end: usize) -> Result<JsValue, JsValue> {
        to_js(&self.widget.history_get(start..end))
    }

    #[wasm_bindgen(js_name = historyGetAllCopy)]
    pub fn history_get_all_copy(&self) -> Result<JsValue, JsValue> {
        to_js(&self.widget.history_all())
    }

    #[wasm_bindgen(js_name = historyGetMessage)]
    pub fn history_get_message(&self, index: usize) -> Result<JsValue, JsValue> {
        match self.widget.history_get_message(index) {
            Some(message) => to_js(message),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    #[wasm_bindgen(js_name = historyGetMessageContent)]
    pub fn history_get_message_content(&self, index: usize) -> String {
        self.widget
            .history_get_message(index)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }

    /// One page of history. `order` is `"asc"` or `"desc"`.
    #[wasm_bindgen(js_name = historyGetPage)]
    pub fn history_get_page(
        &self,
        page: usize,
        page_size: usize,
        order: &str,
    ) -> Result<JsValue, JsValue> {
        let order: SortOrder = serde_json::from_value(serde_json::Value::String(order.to_string()))
            .map_err(WebChatError::from)?;
        to_js(&self.widget.history_get_page(page, page_size, order))
    }

    /// Records matching a filter object (`text`, `userString`, `role`,
    /// `tag`, `limit`).
    #[wasm_bindgen(js_name = historySearch)]
    pub fn history_search(&self, filter: JsValue) -> Result<JsValue, JsValue> {
        let filter: SearchFilter = if filter.is_undefined() || filter.is_null() {
            SearchFilter::default()
        } else {
            from_js(&filter)?
        };
        to_js(&self.widget.history_search(&filter))
    }

    #[wasm_bindgen(js_name = historyGetInfo)]
    pub fn history_get_info(&self) -> Result<JsValue, JsValue> {
        to_js(&self.widget.history_info())
    }

    #[wasm_bindgen(js_name = historyClear)]
    pub fn history_clear(&mut self) {
        self.widget.history_clear();
    }

    /// Replace the history with an array of saved records. Fresh msgids are
    /// assigned; the returned array lists them in order.
    #[wasm_bindgen(js_name = historyRestoreAll)]
    pub fn history_restore_all(&mut self, messages: JsValue) -> Result<Array, JsValue> {
        let messages: Vec<NewMessage> = from_js(&messages)?;
        let ids = self.widget.history_restore_all(messages);
        Ok(ids
            .into_iter()
            .map(|id| JsValue::from_f64(id as f64))
            .collect())
    }

    // ── Tags ────────────────────────────────────────────────────────────

    #[wasm_bindgen(js_name = getActiveTags)]
    pub fn get_active_tags(&self) -> Array {
        self.widget
            .active_tags()
            .iter()
            .map(|t| JsValue::from_str(t))
            .collect()
    }

    /// Show or hide every message carrying `tag`. Returns `false` for tags
    /// outside `[A-Za-z0-9-]+`.
    #[wasm_bindgen(js_name = setTagVisibility)]
    pub fn set_tag_visibility(&mut self, tag: &str, visible: bool) -> bool {
        self.widget.set_tag_visibility(tag, visible)
    }

    #[wasm_bindgen(js_name = getTagVisibility)]
    pub fn get_tag_visibility(&self, tag: &str) -> bool {
        self.widget.tag_visibility(tag)
    }

    // ── Events ──────────────────────────────────────────────────────────

    /// Call `listener({ kind, msgid, content? })` after every committed
    /// change. Returns a handle for [`WebChat::off`].
    pub fn on(&mut self, listener: Function) -> usize {
        #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
        let id = self.widget.subscribe(move |event| {
            let payload = EventPayload::from(event);
            if let Ok(value) = to_js(&payload)
                && let Err(err) = listener.call1(&JsValue::NULL, &value)
            {
                fchat::core::warn!(error = ?err, "event listener threw");
            }
        });
        self.hooks.push(Some(id));
        self.hooks.len() - 1
    }

    pub fn off(&mut self, handle: usize) -> bool {
        match self.hooks.get_mut(handle).and_then(Option::take) {
            Some(id) => self.widget.unsubscribe(id),
            None => false,
        }
    }

    // ── Host events ─────────────────────────────────────────────────────

    #[wasm_bindgen(js_name = onScroll)]
    pub fn on_scroll(&mut self) {
        self.widget.on_scroll(self.epoch.elapsed());
    }

    #[wasm_bindgen(js_name = onResize)]
    pub fn on_resize(&mut self) {
        self.widget.on_resize();
    }

    /// Returns whether the visible window or measured heights changed.
    #[wasm_bindgen(js_name = onFrame)]
    pub fn on_frame(&mut self) -> bool {
        self.widget.on_frame(self.epoch.elapsed())
    }

    #[wasm_bindgen(js_name = forceUpdate)]
    pub fn force_update(&mut self) {
        self.widget.force_update();
    }

    /// Explicit teardown for JS callers: drops every node and listener. The
    /// history is kept.
    pub fn destroy(&mut self) {
        self.widget.destroy();
        self.hooks.clear();
    }
}
