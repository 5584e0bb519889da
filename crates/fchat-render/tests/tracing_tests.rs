#![forbid(unsafe_code)]

//! Tracing span instrumentation of the virtual scroller.
//!
//! Spans enabled:
//!   cargo test -p fchat-render --features tracing --test tracing_tests
//!
//! Zero-overhead verification (no feature):
//!   cargo test -p fchat-render --test tracing_tests -- zero_overhead

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use fchat_core::{HistoryStore, ManualClock, NewMessage, ScrollIntoView, VirtualConfig};
use fchat_render::{MemoryHost, VirtualScroller};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;

// ============================================================================
// Test Infrastructure
// ============================================================================

#[derive(Debug, Clone)]
struct CapturedSpan {
    name: String,
    fields: HashMap<String, String>,
}

struct SpanCapture {
    spans: Arc<Mutex<Vec<CapturedSpan>>>,
}

struct FieldVisitor(Vec<(String, String)>);

impl tracing::field::Visit for FieldVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        self.0.push((field.name().to_string(), format!("{value:?}")));
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.0.push((field.name().to_string(), value.to_string()));
    }
}

impl<S> tracing_subscriber::Layer<S> for SpanCapture
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_new_span(
        &self,
        attrs: &tracing::span::Attributes<'_>,
        _id: &tracing::span::Id,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        let mut visitor = FieldVisitor(Vec::new());
        attrs.record(&mut visitor);
        self.spans.lock().unwrap().push(CapturedSpan {
            name: attrs.metadata().name().to_string(),
            fields: visitor.0.into_iter().collect(),
        });
    }
}

fn with_captured_spans<F: FnOnce()>(f: F) -> Vec<CapturedSpan> {
    let spans = Arc::new(Mutex::new(Vec::new()));
    let layer = SpanCapture {
        spans: spans.clone(),
    };
    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, f);
    let captured = spans.lock().unwrap().clone();
    captured
}

fn scroll_through(n: usize) {
    let mut store = HistoryStore::new(usize::MAX).with_clock(ManualClock::new(0));
    let mut host = MemoryHost::new(400).with_fixed_height(80);
    let mut s = VirtualScroller::new(VirtualConfig::default(), true);
    for i in 0..n {
        let id = store.append(NewMessage::new(format!("m{i}")));
        let msg = store.get(id).cloned().unwrap();
        s.add_item(&mut host, msg, ScrollIntoView::Never);
    }
    s.scroll_to_bottom(&mut host);
}

// ============================================================================
// Tests
// ============================================================================

#[test]
#[cfg(feature = "tracing")]
fn render_passes_emit_window_spans() {
    let spans = with_captured_spans(|| scroll_through(50));
    let renders: Vec<_> = spans.iter().filter(|s| s.name == "virtual_render").collect();
    assert!(!renders.is_empty(), "no virtual_render spans captured");

    let last = renders.last().unwrap();
    assert_eq!(last.fields.get("end").map(String::as_str), Some("50"));
    assert_eq!(last.fields.get("len").map(String::as_str), Some("50"));
    assert!(last.fields.contains_key("start"));
}

#[test]
fn zero_overhead_without_feature() {
    let spans = with_captured_spans(|| scroll_through(50));
    let renders = spans.iter().filter(|s| s.name == "virtual_render").count();
    if cfg!(feature = "tracing") {
        assert!(renders > 0);
    } else {
        assert_eq!(renders, 0);
    }
}
