//! End-to-end tests of the chat widget over the in-memory host.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use fchat::prelude::*;
use fchat::{ActiveRenderer, ConfigError, EscapeHtml, ManualClock, Parity};
use pretty_assertions::assert_eq;

const JAN_2024: i64 = 1_704_067_200_000;

fn widget(config: ChatConfig) -> ChatWidget<MemoryHost> {
    ChatWidget::new(config, MemoryHost::new(400).with_fixed_height(80))
        .unwrap()
        .with_clock(ManualClock::new(JAN_2024).with_step(1))
}

fn direct() -> ChatWidget<MemoryHost> {
    widget(ChatConfig::default())
}

fn fill(w: &mut ChatWidget<MemoryHost>, n: usize) -> Vec<MsgId> {
    (0..n)
        .map(|i| w.message_add_new(NewMessage::new(format!("message {i}")).scroll(ScrollIntoView::Never)))
        .collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn invalid_config_is_rejected() {
    let err = ChatWidget::new(
        ChatConfig::default().with_history_limit(0),
        MemoryHost::new(100),
    )
    .unwrap_err();
    assert_eq!(err, Error::Config(ConfigError::ZeroHistoryLimit));
    assert!(err.to_string().contains("history_limit"));
}

#[test]
fn version_reports_package() {
    let v = ChatWidget::<MemoryHost>::version();
    assert_eq!(v.name, "fchat");
    assert_eq!(v.license, "MIT");
    assert!(v.to_string().starts_with("fchat "));
}

// ============================================================================
// Messages
// ============================================================================

#[test]
fn add_fills_defaults_and_renders() {
    let mut w = direct();
    let id = w.message_add("hello", "alice", Align::Left, "assistant");
    assert_eq!(id, 0);

    let msg = w.message_get(id).unwrap();
    assert_eq!(msg.user_string, "alice");
    assert_eq!(msg.role, "assistant");
    assert_eq!(msg.user_id, -1);
    assert_eq!(msg.timestamp, "2024-01-01T00:00:00.000Z");
    assert_eq!(msg.updated_time, msg.timestamp);

    let node = w.host().node_for(id).unwrap();
    assert_eq!(node.content, "hello");
    assert_eq!(node.align, Align::Left);
    assert_eq!(node.parity, Some(Parity::First));
}

#[test]
fn content_updates_refresh_updated_time() {
    let mut w = direct();
    let id = w.message_add_new(NewMessage::new("Hel"));
    assert!(w.message_append_content(id, "lo"));
    assert_eq!(w.message_content(id), Some("Hello"));
    assert_eq!(w.host().node_for(id).unwrap().content, "Hello");

    let before = w.message_get(id).unwrap().updated_time.clone();
    assert!(w.message_replace_content(id, "Bye"));
    let msg = w.message_get(id).unwrap();
    assert_eq!(msg.content, "Bye");
    assert!(msg.updated_time > before);
}

#[test]
fn unknown_ids_are_noops() {
    let mut w = direct();
    fill(&mut w, 2);
    assert!(!w.message_remove(7));
    assert!(!w.message_append_content(7, "x"));
    assert!(!w.message_replace_content(7, "x"));
    assert!(!w.message_set_visibility(7, false));
    assert_eq!(w.message_visibility(7), None);
    assert!(!w.message_scroll_to(7));
    assert_eq!(w.history_count(), 2);
}

#[test]
fn remove_last_takes_highest_id() {
    let mut w = direct();
    fill(&mut w, 3);
    assert!(w.message_remove(2));
    assert!(w.message_remove_last());
    assert_eq!(w.history_count(), 1);
    assert_eq!(w.history_get_message(0).unwrap().msgid, 0);
    assert!(w.message_remove_last());
    assert!(!w.message_remove_last());
    assert_eq!(w.rendered_count(), 0);
}

#[test]
fn sanitizer_applies_to_every_write() {
    let mut w = direct().with_sanitizer(EscapeHtml);
    let id = w.message_add_new(NewMessage::new("<b>hi</b>"));
    w.message_append_content(id, " & bye");
    assert_eq!(w.message_content(id), Some("&lt;b&gt;hi&lt;/b&gt; &amp; bye"));
    w.message_replace_content(id, "'x'");
    assert_eq!(w.host().node_for(id).unwrap().content, "&#39;x&#39;");
}

#[test]
fn swapped_sanitizer_leaves_stored_content() {
    let mut w = direct();
    let raw = w.message_add_new(NewMessage::new("<i>a</i>"));
    w.set_sanitizer(fchat::FnSanitizer(|s: &str| s.to_uppercase()));
    let loud = w.message_add_new(NewMessage::new("b"));
    assert_eq!(w.message_content(raw), Some("<i>a</i>"));
    assert_eq!(w.message_content(loud), Some("B"));
}

#[test]
fn retention_evicts_oldest_from_history_and_host() {
    let mut w = widget(ChatConfig::default().with_history_limit(3));
    fill(&mut w, 5);
    assert_eq!(w.history_count(), 3);
    assert_eq!(w.history_get_message(0).unwrap().msgid, 2);
    assert_eq!(w.rendered_count(), 3);
    assert!(w.host().node_for(1).is_none());
}

// ============================================================================
// Hooks
// ============================================================================

#[test]
fn hooks_fire_in_subscription_order_after_commit() {
    let mut w = direct();
    let log: Rc<RefCell<Vec<String>>> = Rc::default();

    let first = log.clone();
    w.subscribe(move |e| first.borrow_mut().push(format!("a:{e:?}")));
    let second = log.clone();
    let id_b = w.subscribe(move |e| second.borrow_mut().push(format!("b:{}", e.msgid())));

    let id = w.message_add_new(NewMessage::new("x"));
    w.message_append_content(id, "y");
    w.message_replace_content(id, "z");
    w.message_remove(id);

    assert_eq!(
        *log.borrow(),
        vec![
            "a:Added { msgid: 0 }".to_string(),
            "b:0".into(),
            "a:Appended { msgid: 0, content: \"y\" }".into(),
            "b:0".into(),
            "a:Replaced { msgid: 0, content: \"z\" }".into(),
            "b:0".into(),
            "a:Deleted { msgid: 0 }".into(),
            "b:0".into(),
        ]
    );

    assert!(w.unsubscribe(id_b));
    assert!(!w.unsubscribe(id_b));
    log.borrow_mut().clear();
    w.message_add_new(NewMessage::new("again"));
    assert_eq!(*log.borrow(), vec!["a:Added { msgid: 1 }".to_string()]);
}

#[test]
fn failed_mutations_emit_nothing() {
    let mut w = direct();
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    w.subscribe(move |_| *c.borrow_mut() += 1);
    w.message_remove(3);
    w.message_append_content(3, "x");
    assert_eq!(*count.borrow(), 0);
}

// ============================================================================
// History
// ============================================================================

#[test]
fn paging_in_both_orders() {
    let mut w = direct();
    fill(&mut w, 120);

    let page = w.history_get_page(1, 50, SortOrder::Ascending);
    assert_eq!(page.messages.first().unwrap().msgid, 0);
    assert_eq!(page.messages.len(), 50);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(page.pagination.has_next);
    assert!(!page.pagination.has_previous);

    let last = w.history_get_page(3, 50, SortOrder::Ascending);
    let ids: Vec<MsgId> = last.messages.iter().map(|m| m.msgid).collect();
    assert_eq!(ids, (100..120).collect::<Vec<_>>());
    assert!(!last.pagination.has_next);

    let newest = w.history_get_page(1, 50, SortOrder::Descending);
    assert_eq!(newest.messages.first().unwrap().msgid, 119);
    assert_eq!(newest.messages.last().unwrap().msgid, 70);

    let clamped = w.history_get_page(99, 50, SortOrder::Ascending);
    assert_eq!(clamped.pagination.current_page, 3);
}

#[test]
fn search_is_conjunctive() {
    let mut w = direct();
    w.message_add_new(NewMessage::new("Deploy finished").user("ci").tag("ops"));
    w.message_add_new(NewMessage::new("deploy failed").user("ci").tag("alert"));
    w.message_add_new(NewMessage::new("lunch?").user("bob"));

    let hits = w.history_search(&SearchFilter::new().text("DEPLOY"));
    assert_eq!(hits.len(), 2);

    let hits = w.history_search(&SearchFilter::new().text("deploy").tag("alert"));
    assert_eq!(hits.iter().map(|m| m.msgid).collect::<Vec<_>>(), vec![1]);

    let hits = w.history_search(&SearchFilter::new().user("bob").text("deploy"));
    assert!(hits.is_empty());
}

#[test]
fn info_summarizes_both_ends() {
    let mut w = direct();
    assert_eq!(w.history_info().total_messages, 0);
    assert!(w.history_info().oldest.is_none());

    fill(&mut w, 60);
    let info = w.history_info();
    assert_eq!(info.total_messages, 60);
    assert_eq!(info.total_pages, 2);
    assert_eq!(info.oldest.unwrap().msgid, 0);
    assert_eq!(info.newest.unwrap().msgid, 59);
    assert!(info.average_message_size > 0);
}

#[test]
fn history_slice_is_clamped() {
    let mut w = direct();
    fill(&mut w, 5);
    assert_eq!(w.history_get(3..10).len(), 2);
    assert!(w.history_get(8..10).is_empty());
}

#[test]
fn restore_round_trips_saved_history() {
    let mut w = direct();
    w.message_add_new(NewMessage::new("one").user("ann").tag("a"));
    w.message_add_new(NewMessage::new("two").user("bo").align(Align::Left));
    w.message_add_new(NewMessage::new("three").visible(false));
    w.message_remove(1);
    let saved = w.history_all();

    let mut restored = direct();
    let ids = restored.history_restore_all(saved.iter().map(Message::to_new));
    assert_eq!(ids, vec![0, 1]);

    let again = restored.history_all();
    assert_eq!(again.len(), saved.len());
    for (a, b) in saved.iter().zip(&again) {
        assert_eq!(a.content, b.content);
        assert_eq!(a.user_string, b.user_string);
        assert_eq!(a.align, b.align);
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.visible, b.visible);
        assert_eq!(a.tags, b.tags);
    }
    assert_eq!(restored.active_tags(), vec!["a".to_string()]);
}

#[test]
fn restore_keeps_escaped_content_as_saved() {
    let mut w = direct().with_sanitizer(EscapeHtml);
    w.message_add_new(NewMessage::new("a < b & c"));
    w.message_add_new(NewMessage::new("<i>x</i>"));
    let saved = w.history_all();
    assert_eq!(saved[0].content, "a &lt; b &amp; c");

    w.history_restore_all(saved.iter().map(Message::to_new));
    let contents: Vec<String> = w.history_all().into_iter().map(|m| m.content).collect();
    assert_eq!(contents, vec!["a &lt; b &amp; c", "&lt;i&gt;x&lt;/i&gt;"]);
    assert_eq!(w.host().node_for(1).unwrap().content, "&lt;i&gt;x&lt;/i&gt;");

    // Writes after a restore still go through the sanitizer.
    let id = w.message_add_new(NewMessage::new("<b>"));
    assert_eq!(w.message_content(id), Some("&lt;b&gt;"));
}

#[test]
fn clear_resets_ids_and_nodes() {
    let mut w = direct();
    fill(&mut w, 4);
    w.history_clear();
    assert_eq!(w.history_count(), 0);
    assert_eq!(w.host().node_count(), 0);
    assert_eq!(w.message_add_new(NewMessage::new("fresh")), 0);
}

// ============================================================================
// Tags
// ============================================================================

#[test]
fn tag_visibility_hides_current_and_future_messages() {
    let mut w = direct();
    let a = w.message_add_new(NewMessage::new("debug 1").tag("debug"));
    let b = w.message_add_new(NewMessage::new("hello"));
    assert_eq!(w.active_tags(), vec!["debug".to_string()]);
    assert!(w.tag_visibility("debug"));

    assert!(w.set_tag_visibility("debug", false));
    assert!(!w.tag_visibility("debug"));
    assert_eq!(w.message_visibility(a), Some(false));
    assert!(!w.host().node_for(a).unwrap().visible);
    assert_eq!(w.host().node_for(b).unwrap().parity, Some(Parity::First));

    let c = w.message_add_new(NewMessage::new("debug 2").tag("debug"));
    assert_eq!(w.message_visibility(c), Some(false));

    assert!(w.set_tag_visibility("debug", true));
    assert_eq!(w.message_visibility(c), Some(true));
}

#[test]
fn invalid_tags_collapse_to_false() {
    let mut w = direct();
    assert!(!w.set_tag_visibility("not valid", false));
    assert!(!w.tag_visibility("not valid"));
    assert!(matches!(
        w.try_set_tag_visibility("", true),
        Err(Error::InvalidTag(_))
    ));
    assert!(w.tag_visibility("never-seen"));
}

// ============================================================================
// Renderer selection
// ============================================================================

#[test]
fn auto_mode_migrates_at_threshold() {
    let mut w = widget(ChatConfig::default().with_render_mode(RenderMode::Auto { threshold: 50 }));
    fill(&mut w, 49);
    assert_eq!(w.active_renderer(), ActiveRenderer::Direct);
    assert_eq!(w.rendered_count(), 49);

    fill(&mut w, 1);
    assert_eq!(w.active_renderer(), ActiveRenderer::Virtual);
    let scroller = w.scroller().unwrap();
    assert_eq!(scroller.len(), 50);
    assert!(w.rendered_count() < 50);
    assert_eq!(w.host().node_count(), w.rendered_count());

    w.history_clear();
    assert_eq!(w.active_renderer(), ActiveRenderer::Virtual);
}

#[test]
fn virtual_mode_keeps_node_count_bounded() {
    let mut w = widget(ChatConfig::default().with_render_mode(RenderMode::Virtual));
    for i in 0..2_000 {
        w.message_add_new(NewMessage::new(format!("m{i}")));
    }
    assert!(w.rendered_count() <= 400 / 80 + 1 + 2 * 5);
    assert_eq!(w.host().viewport().scroll_top, 2_000 * 80 - 400);

    w.host_mut().set_scroll_top(0);
    w.on_scroll(Duration::from_millis(100));
    assert!(w.on_frame(Duration::from_millis(116)));
    assert_eq!(w.scroller().unwrap().range().start, 0);

    assert!(w.message_remove(0));
    assert_eq!(w.host().nodes().next().unwrap().msgid, 1);
}

#[test]
fn direct_mode_ignores_frame_events() {
    let mut w = direct();
    fill(&mut w, 3);
    w.on_scroll(Duration::ZERO);
    w.on_resize();
    w.force_update();
    assert!(!w.on_frame(Duration::from_millis(16)));
}

#[test]
fn destroy_empties_host_and_drops_hooks() {
    let mut w = widget(ChatConfig::default().with_render_mode(RenderMode::Virtual));
    let count = Rc::new(RefCell::new(0));
    let c = count.clone();
    w.subscribe(move |_| *c.borrow_mut() += 1);
    fill(&mut w, 20);
    assert_eq!(*count.borrow(), 20);

    w.destroy();
    assert_eq!(w.host().node_count(), 0);
    assert_eq!(w.history_count(), 20);
    w.message_remove(0);
    assert_eq!(*count.borrow(), 20);
}
