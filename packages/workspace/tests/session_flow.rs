/// Integration tests for an editing session
/// Tests queued writes → worker reads → derived caches
use std::sync::Arc;

use snippet_editor::{LayoutRequest, StyleRequest, StyleProperty};
use snippet_engine::{Engine, EngineConfig};
use snippet_sourcemap::SourcePosition;
use snippet_workspace::{
    DerivedCache, DocumentView, EngineWorker, InspectState, LatestRequest, LayoutQueue,
};

const HERO: &str = r#"export default function Hero() {
  return (
    <section className="flex flex-col p-12">
      <h1 className="text-5xl font-bold">Summer Sale</h1>
    </section>
  );
}
"#;

#[tokio::test]
async fn test_drag_then_read() {
    let engine = Arc::new(Engine::new(EngineConfig::default()));
    let client = EngineWorker::spawn(engine.clone());
    let queue = LayoutQueue::new("hero", HERO);
    let heading = SourcePosition::new(4, 8);

    // A drag emits several writes before any completes
    let writes: Vec<_> = (1..=5)
        .map(|step| {
            queue.apply_layout(
                engine.clone(),
                LayoutRequest::translate(heading, 4.0 * step as f64, 0.0),
            )
        })
        .collect();
    for outcome in futures::future::join_all(writes).await {
        assert!(outcome.unwrap().changed);
    }

    let buffer = queue.current().await;
    assert_eq!(buffer.matches("<h1").count(), 1);

    let state = client.read_style_state(buffer.clone(), heading).await.unwrap();
    assert!(state.found);
    assert_eq!(state.element_name.as_deref(), Some("h1"));
}

#[tokio::test]
async fn test_style_write_through_worker() {
    let engine = Arc::new(Engine::new(EngineConfig::default()));
    let client = EngineWorker::spawn(engine);
    let heading = SourcePosition::new(4, 8);

    let request = StyleRequest::new(heading).set(StyleProperty::FontSize, 24.0);
    let outcome = client.apply_style(HERO, request).await.unwrap();
    assert!(outcome.changed);
    assert_ne!(outcome.source, HERO);
}

#[tokio::test]
async fn test_debounced_reads_keep_the_last() {
    let engine = Arc::new(Engine::new(EngineConfig::default()));
    let latest = LatestRequest::from_config(&engine.config().reads);
    let client = EngineWorker::spawn(engine);

    let positions = [SourcePosition::new(3, 6), SourcePosition::new(4, 8)];
    let tickets: Vec<_> = positions.iter().map(|_| latest.begin()).collect();
    let reads = positions.iter().zip(tickets).map(|(&position, ticket)| {
        let client = client.clone();
        latest.settle(ticket, async move { client.read_style_state(HERO, position).await })
    });
    let results = futures::future::join_all(reads).await;

    assert!(results[0].is_none());
    let last = results[1].as_ref().unwrap().as_ref().unwrap();
    assert_eq!(last.element_name.as_deref(), Some("h1"));
}

#[test]
fn test_hover_uses_cached_index() {
    let engine = Engine::new(EngineConfig::default());
    let cache = DerivedCache::new();
    let mut state = InspectState::new();
    let view = DocumentView {
        session: "hero",
        version: 1,
        source: HERO,
    };

    let target = state.hover(&engine, &cache, view, 4, 8).cloned().unwrap();
    assert_eq!(target.name.as_deref(), Some("h1"));
    state.hover(&engine, &cache, view, 3, 6);
    assert_eq!(state.hovered().and_then(|t| t.name.as_deref()), Some("section"));
    assert_eq!(cache.stats().hits, 2);
}
