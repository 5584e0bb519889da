//! Benchmarks for the direct and virtual renderers
//!
//! Run with: cargo bench -p fchat-render

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fchat_core::lorem::lorem_ipsum;
use fchat_core::{HistoryStore, ManualClock, Message, NewMessage, ScrollIntoView, VirtualConfig};
use fchat_render::{
    DirectRenderer, MemoryHost, MessageRenderer, RenderHost, VirtualScroller,
};

fn history(n: usize) -> Vec<Message> {
    let mut store = HistoryStore::new(usize::MAX).with_clock(ManualClock::new(0));
    for i in 0..n {
        store.append(NewMessage::new(lorem_ipsum(40 + (i * 37) % 200, i * 13, true)));
    }
    store.all()
}

// ============================================================================
// Appending with follow-to-bottom
// ============================================================================

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/append_follow");

    for n in [1_000usize, 10_000] {
        let items = history(n);

        group.bench_with_input(BenchmarkId::new("virtual", n), &items, |b, items| {
            b.iter(|| {
                let mut host = MemoryHost::new(600);
                let mut s = VirtualScroller::new(VirtualConfig::default(), true);
                for m in items {
                    s.add_item(&mut host, m.clone(), ScrollIntoView::Always);
                }
                black_box(s.rendered_count());
            })
        });

        group.bench_with_input(BenchmarkId::new("direct", n), &items, |b, items| {
            b.iter(|| {
                let mut host = MemoryHost::new(600);
                let mut r = DirectRenderer::new(true, 100);
                for m in items {
                    r.add(&mut host, m, ScrollIntoView::Never);
                }
                black_box(r.rendered_count());
            })
        });
    }

    group.finish();
}

// ============================================================================
// Scrolling through a long history
// ============================================================================

fn bench_scroll(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/scroll");

    for n in [10_000usize, 100_000] {
        let mut host = MemoryHost::new(600);
        let mut s = VirtualScroller::new(VirtualConfig::default(), true);
        s.set_items(&mut host, history(n));
        let max = host.viewport().max_scroll_top();

        group.bench_with_input(BenchmarkId::new("jump", n), &max, |b, &max| {
            let mut top = 0u32;
            b.iter(|| {
                top = (top + 7_919) % max.max(1);
                host.set_scroll_top(top);
                s.force_update(&mut host);
                s.after_paint(&mut host);
                black_box(s.range());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_append, bench_scroll);
criterion_main!(benches);
