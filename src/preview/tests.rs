use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use super::*;
use crate::engine::{EngineError, EngineGateway, Theme};
use crate::testing::{FakeEngine, fake_gateway};

const TWO_VIEWS: &str = "Login 320x480\nDashboard 1024x768";

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn session() -> (Arc<FakeEngine>, PreviewSession) {
    let (engine, gateway) = fake_gateway();
    let session = PreviewSession::new(SessionId(1), gateway, PreviewSettings::default());
    (engine, session)
}

/// Edit and let the debounce window elapse. Returns the time after the pass.
fn settle(session: &mut PreviewSession, text: &str, now: Instant) -> (Instant, PreviewEvent) {
    session.on_edit(text, now);
    let fire = now + ms(DEBOUNCE_MS);
    let event = session.on_timer(fire).expect("debounce fired");
    (fire, event)
}

fn rendered(event: &PreviewEvent) -> (&crate::engine::VisualOutput, &[String], Option<&str>) {
    match event {
        PreviewEvent::Rendered {
            visual,
            views,
            selected,
            ..
        } => (visual, views, selected.as_deref()),
        other => panic!("expected Rendered, got {other:?}"),
    }
}

fn failed_gateway() -> Arc<EngineGateway> {
    Arc::new(EngineGateway::new(|| {
        Err(EngineError::Load("engine binary not found".into()))
    }))
}

// =============================================================================
// Debounce
// =============================================================================

#[test]
fn test_fresh_session_is_waiting() {
    let (_, session) = session();
    assert_eq!(session.phase(), Phase::Waiting);
    assert!(session.snapshot().is_none());
    assert!(session.deadline().is_none());
}

#[test]
fn test_burst_of_edits_renders_once_with_latest_text() {
    let (engine, mut session) = session();
    let t0 = Instant::now();

    session.on_edit("Login 320x480", t0);
    session.on_edit(TWO_VIEWS, t0 + ms(100));
    assert_eq!(session.phase(), Phase::PendingDebounce);

    // First edit's window would have ended here
    assert!(session.on_timer(t0 + ms(300)).is_none());
    assert_eq!(engine.parse_calls(), 0);

    let event = session.on_timer(t0 + ms(400)).unwrap();
    let (_, views, selected) = rendered(&event);
    assert_eq!(views, ["Login", "Dashboard"]);
    assert_eq!(selected, Some("Login"));

    assert_eq!(engine.parse_calls(), 1);
    assert_eq!(engine.rendered_sources(), vec![TWO_VIEWS.to_string()]);
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn test_timer_without_pending_edit_is_noop() {
    let (engine, mut session) = session();
    assert!(session.on_timer(Instant::now() + ms(10_000)).is_none());
    assert_eq!(engine.parse_calls(), 0);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_parse_error_keeps_previous_visual() {
    let (engine, mut session) = session();
    let (t1, _) = settle(&mut session, "Login 320x480", Instant::now());
    let before = session.snapshot().unwrap();

    let (t2, event) = settle(&mut session, "Login 320x480\noops!", t1);
    match event {
        PreviewEvent::Failed { message, fatal, .. } => {
            assert_eq!(message, "parse error on line 2: unexpected `!`");
            assert!(!fatal);
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert_eq!(session.phase(), Phase::Error);

    // Cached snapshot is untouched
    let after = session.snapshot().unwrap();
    assert_eq!(after.document.id(), before.document.id());

    // Presentation changes wait for a successful pass
    assert!(session.on_theme(Theme::Dark).is_none());
    assert_eq!(engine.render_calls(), 1);

    let (_, event) = settle(&mut session, TWO_VIEWS, t2);
    let (visual, views, _) = rendered(&event);
    assert_eq!(views.len(), 2);
    assert_eq!(visual.theme, Theme::Dark);
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn test_render_failure_does_not_commit() {
    let (engine, mut session) = session();
    let (t1, _) = settle(&mut session, "Login 320x480", Instant::now());
    let before = session.snapshot().unwrap().document.id();

    engine.fail_view("Login");
    let (_, event) = settle(&mut session, "Login 320x480\nDashboard 1024x768", t1);
    assert!(matches!(event, PreviewEvent::Failed { fatal: false, .. }));
    assert_eq!(session.snapshot().unwrap().document.id(), before);
    assert_eq!(session.state().views(), ["Login"]);
}

#[test]
fn test_fatal_load_stops_processing_edits() {
    let mut session =
        PreviewSession::new(SessionId(7), failed_gateway(), PreviewSettings::default());
    let t0 = Instant::now();

    let (t1, event) = settle(&mut session, "Login 320x480", t0);
    match event {
        PreviewEvent::Failed {
            session: id,
            message,
            fatal,
        } => {
            assert_eq!(id, SessionId(7));
            assert!(fatal);
            assert!(message.contains("engine binary not found"));
        }
        other => panic!("expected Failed, got {other:?}"),
    }
    assert!(session.is_fatal());

    session.on_edit("Login 320x480\nDashboard 1024x768", t1);
    assert!(session.deadline().is_none());
    assert_eq!(session.phase(), Phase::Error);
    assert!(session.on_timer(t1 + ms(1000)).is_none());
    assert!(session.on_theme_toggle().is_none());
}

// =============================================================================
// Render-only changes
// =============================================================================

#[test]
fn test_theme_change_skips_parse_and_layout() {
    let (engine, mut session) = session();
    settle(&mut session, TWO_VIEWS, Instant::now());

    let event = session.on_theme(Theme::Dark).unwrap();
    let (visual, _, _) = rendered(&event);
    assert_eq!(visual.theme, Theme::Dark);
    assert!(visual.svg.contains("#99bbff"));

    assert_eq!(engine.parse_calls(), 1);
    assert_eq!(engine.layout_calls(), 1);
    assert_eq!(engine.render_calls(), 2);

    // Same theme again is a no-op
    assert!(session.on_theme(Theme::Dark).is_none());
    assert_eq!(engine.render_calls(), 2);
}

#[test]
fn test_view_select_renders_at_view_size() {
    let (engine, mut session) = session();
    settle(&mut session, TWO_VIEWS, Instant::now());

    let event = session.on_view_select("Dashboard").unwrap();
    let (visual, _, selected) = rendered(&event);
    assert_eq!(selected, Some("Dashboard"));
    assert_eq!((visual.width, visual.height), (1024.0, 768.0));
    assert!(visual.svg.contains(r#"width="1024""#));
    assert_eq!(engine.parse_calls(), 1);

    assert!(session.on_view_select("Settings").is_none());
    assert_eq!(session.state().selected_view(), Some("Dashboard"));
}

#[test]
fn test_renamed_view_falls_back_to_first() {
    let (_, mut session) = session();
    let (t1, _) = settle(&mut session, TWO_VIEWS, Instant::now());
    session.on_view_select("Dashboard");

    let (_, event) = settle(&mut session, "Login 320x480\nOverview 1024x768", t1);
    let (visual, _, selected) = rendered(&event);
    assert_eq!(selected, Some("Login"));
    assert_eq!(visual.view.as_deref(), Some("Login"));
}

#[test]
fn test_render_only_keeps_pending_debounce() {
    let (engine, mut session) = session();
    let (t1, _) = settle(&mut session, TWO_VIEWS, Instant::now());

    session.on_edit("Login 320x480", t1);
    let deadline = session.deadline().unwrap();

    assert!(session.on_theme_toggle().is_some());
    assert_eq!(session.phase(), Phase::PendingDebounce);
    assert_eq!(session.deadline(), Some(deadline));

    let event = session.on_timer(deadline).unwrap();
    let (_, views, _) = rendered(&event);
    assert_eq!(views, ["Login"]);
    assert_eq!(engine.parse_calls(), 2);
}

#[test]
fn test_failed_render_only_does_not_block_presentation_changes() {
    let (engine, mut session) = session();
    settle(&mut session, TWO_VIEWS, Instant::now());

    engine.fail_view("Dashboard");
    let event = session.on_view_select("Dashboard").unwrap();
    assert!(matches!(event, PreviewEvent::Failed { fatal: false, .. }));
    assert_eq!(session.phase(), Phase::Error);

    // The snapshot still matches the text, so other views keep rendering
    let event = session.on_view_select("Login").unwrap();
    let (visual, _, selected) = rendered(&event);
    assert_eq!(selected, Some("Login"));
    assert_eq!((visual.width, visual.height), (320.0, 480.0));
    assert_eq!(session.phase(), Phase::Idle);

    let event = session.on_theme(Theme::Dark).unwrap();
    assert_eq!(rendered(&event).0.theme, Theme::Dark);
    assert_eq!(engine.parse_calls(), 1);
    assert_eq!(engine.render_calls(), 4);
}

#[test]
fn test_document_without_views_uses_fallback_size() {
    let (_, mut session) = session();
    let (_, event) = settle(&mut session, "", Instant::now());
    let (visual, views, selected) = rendered(&event);
    assert!(views.is_empty());
    assert_eq!(selected, None);
    assert_eq!(visual.view, None);
    assert_eq!((visual.width, visual.height), FALLBACK_SIZE);
}

#[test]
fn test_unchanged_text_skips_parse() {
    let (engine, mut session) = session();
    let (t1, first) = settle(&mut session, TWO_VIEWS, Instant::now());
    let (_, second) = settle(&mut session, TWO_VIEWS, t1);

    assert_eq!(engine.parse_calls(), 1);
    assert_eq!(engine.render_calls(), 2);
    assert_eq!(rendered(&first).0.svg, rendered(&second).0.svg);
    match second {
        PreviewEvent::Rendered { revision, .. } => assert_eq!(revision, 2),
        other => panic!("expected Rendered, got {other:?}"),
    }
}

#[test]
fn test_zoom_emits_event_without_render() {
    let (engine, mut session) = session();
    settle(&mut session, TWO_VIEWS, Instant::now());

    match session.on_zoom(ZoomAction::In).unwrap() {
        PreviewEvent::Zoomed { zoom, .. } => assert_eq!(zoom, 1.1),
        other => panic!("expected Zoomed, got {other:?}"),
    }
    assert!(session.on_zoom(ZoomAction::Set(1.1)).is_none());
    assert_eq!(engine.render_calls(), 1);
}

// =============================================================================
// Focus
// =============================================================================

#[test]
fn test_focus_change_renders_immediately() {
    let (engine, mut session) = session();
    let t0 = Instant::now();
    session.on_edit("Login 320x480", t0);

    let event = session.on_focus_change(DocumentId::from("b.ui"), "Dashboard 1024x768");
    let (_, views, _) = rendered(&event);
    assert_eq!(views, ["Dashboard"]);

    // Pending edit of the previous document was cancelled
    assert!(session.deadline().is_none());
    assert!(session.on_timer(t0 + ms(1000)).is_none());
    assert_eq!(engine.parse_calls(), 1);
    assert_eq!(session.phase(), Phase::Idle);
}

#[test]
fn test_focus_failure_never_shows_previous_document() {
    let (_, mut session) = session();
    session.on_focus_change(DocumentId::from("a.ui"), TWO_VIEWS);
    assert!(session.snapshot().is_some());

    let event = session.on_focus_change(DocumentId::from("b.ui"), "broken!");
    assert!(matches!(event, PreviewEvent::Failed { .. }));
    assert!(session.snapshot().is_none());
    assert!(session.on_view_select("Login").is_none());
}

#[test]
fn test_refocus_same_document_reparses() {
    let (engine, mut session) = session();
    session.on_focus_change(DocumentId::from("a.ui"), TWO_VIEWS);
    session.on_focus_change(DocumentId::from("a.ui"), TWO_VIEWS);
    assert_eq!(engine.parse_calls(), 2);
}

#[test]
fn test_initial_view_preference() {
    let (_, gateway) = fake_gateway();
    let settings = PreviewSettings {
        initial_view: Some("Dashboard".into()),
        ..PreviewSettings::default()
    };
    let mut session = PreviewSession::new(SessionId(1), gateway, settings);
    let (_, event) = settle(&mut session, TWO_VIEWS, Instant::now());
    assert_eq!(rendered(&event).2, Some("Dashboard"));
}

// =============================================================================
// Actor
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_actor_debounces_edits() {
    let (engine, gateway) = fake_gateway();
    let (mut coordinator, mut events) = PreviewCoordinator::new(gateway, PreviewSettings::default());
    let id = coordinator.open();

    let start = Instant::now();
    coordinator.on_edit(id, "Login 320x480").await.unwrap();
    tokio::time::sleep(ms(100)).await;
    coordinator.on_edit(id, TWO_VIEWS).await.unwrap();

    let event = events.recv().await.unwrap();
    assert_eq!(event.session(), id);
    let (_, views, _) = rendered(&event);
    assert_eq!(views, ["Login", "Dashboard"]);
    assert!(start.elapsed() >= ms(100 + DEBOUNCE_MS));

    assert_eq!(engine.parse_calls(), 1);
    assert_eq!(engine.rendered_sources(), vec![TWO_VIEWS.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_actor_presentation_changes_and_snapshot() {
    let (engine, gateway) = fake_gateway();
    let (mut coordinator, mut events) = PreviewCoordinator::new(gateway, PreviewSettings::default());
    let id = coordinator.open();

    assert!(coordinator.snapshot(id).await.unwrap().is_none());

    coordinator.on_focus_change(id, "a.ui", TWO_VIEWS).await.unwrap();
    events.recv().await.unwrap();

    coordinator.on_view_select(id, "Dashboard").await.unwrap();
    events.recv().await.unwrap();
    coordinator.toggle_theme(id).await.unwrap();
    let event = events.recv().await.unwrap();
    let (visual, _, selected) = rendered(&event);
    assert_eq!(selected, Some("Dashboard"));
    assert_eq!(visual.theme, Theme::Dark);

    coordinator.on_zoom(id, ZoomAction::Out).await.unwrap();
    assert!(matches!(
        events.recv().await.unwrap(),
        PreviewEvent::Zoomed { zoom, .. } if zoom == 0.9
    ));

    let snapshot = coordinator.snapshot(id).await.unwrap().unwrap();
    assert_eq!(snapshot.identity.unwrap().as_str(), "a.ui");
    assert_eq!(snapshot.theme, Theme::Dark);
    assert_eq!(snapshot.selected.as_deref(), Some("Dashboard"));
    assert_eq!(snapshot.document.view_names(), vec!["Login", "Dashboard"]);
    assert_eq!(engine.parse_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_sessions_are_independent() {
    let (_, gateway) = fake_gateway();
    let (mut coordinator, mut events) = PreviewCoordinator::new(gateway, PreviewSettings::default());
    let a = coordinator.open();
    let b = coordinator.open();
    assert_ne!(a, b);

    coordinator.on_focus_change(a, "a.ui", "Login 320x480").await.unwrap();
    let first = events.recv().await.unwrap();
    coordinator.on_focus_change(b, "b.ui", "broken!").await.unwrap();
    let second = events.recv().await.unwrap();

    assert_eq!(first.session(), a);
    assert!(matches!(first, PreviewEvent::Rendered { .. }));
    assert_eq!(second.session(), b);
    assert!(matches!(second, PreviewEvent::Failed { .. }));
}

#[tokio::test(start_paused = true)]
async fn test_close_session() {
    let (_, gateway) = fake_gateway();
    let (mut coordinator, _events) = PreviewCoordinator::new(gateway, PreviewSettings::default());
    let id = coordinator.open();
    assert_eq!(coordinator.session_count(), 1);

    coordinator.close(id).await.unwrap();
    assert!(!coordinator.is_open(id));
    assert_eq!(
        coordinator.on_edit(id, "Login 320x480").await,
        Err(PreviewError::UnknownSession(id))
    );
    assert_eq!(
        coordinator.close(id).await,
        Err(PreviewError::UnknownSession(id))
    );
}

#[tokio::test(start_paused = true)]
async fn test_fatal_load_reported_through_actor() {
    let (mut coordinator, mut events) =
        PreviewCoordinator::new(failed_gateway(), PreviewSettings::default());
    let id = coordinator.open();

    coordinator.on_edit(id, "Login 320x480").await.unwrap();
    match events.recv().await.unwrap() {
        PreviewEvent::Failed { fatal, .. } => assert!(fatal),
        other => panic!("expected Failed, got {other:?}"),
    }

    // Later edits are not scheduled, so no further events arrive
    coordinator.on_edit(id, "Login 320x480").await.unwrap();
    let next = tokio::time::timeout(ms(5_000), events.recv()).await;
    assert!(next.is_err());
}

async fn next_event(events: &mut tokio::sync::mpsc::Receiver<PreviewEvent>) -> PreviewEvent {
    tokio::time::timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("event within 5s")
        .expect("event channel open")
}

/// Wait on a std receiver without stalling the runtime.
async fn entered(rx: std::sync::mpsc::Receiver<()>) {
    tokio::task::spawn_blocking(move || rx.recv())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_slow_pass_does_not_stall_other_sessions() {
    let (engine, gateway) = fake_gateway();
    let (mut coordinator, mut events) = PreviewCoordinator::new(gateway, PreviewSettings::default());
    let a = coordinator.open();
    let b = coordinator.open();

    let (started, release) = engine.hold_next_parse();
    coordinator.on_focus_change(a, "a.ui", "Login 320x480").await.unwrap();
    entered(started).await;

    coordinator.on_focus_change(b, "b.ui", TWO_VIEWS).await.unwrap();
    let first = next_event(&mut events).await;
    assert_eq!(first.session(), b);
    assert_eq!(rendered(&first).1, ["Login", "Dashboard"]);

    release.send(()).unwrap();
    let second = next_event(&mut events).await;
    assert_eq!(second.session(), a);
    assert_eq!(rendered(&second).1, ["Login"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_edit_during_render_starts_new_cycle() {
    let (engine, gateway) = fake_gateway();
    let settings = PreviewSettings {
        debounce: ms(20),
        ..PreviewSettings::default()
    };
    let (mut coordinator, mut events) = PreviewCoordinator::new(gateway, settings);
    let id = coordinator.open();

    let (started, release) = engine.hold_next_parse();
    coordinator.on_edit(id, "Login 320x480").await.unwrap();
    entered(started).await;

    // Arrives while the first pass is still parsing
    coordinator.on_edit(id, "Dashboard 1024x768").await.unwrap();
    release.send(()).unwrap();

    let first = next_event(&mut events).await;
    assert_eq!(rendered(&first).2, Some("Login"));

    let second = next_event(&mut events).await;
    assert_eq!(rendered(&second).2, Some("Dashboard"));

    assert_eq!(engine.parse_calls(), 2);
    assert_eq!(
        engine.rendered_sources().last().map(String::as_str),
        Some("Dashboard 1024x768")
    );
}
