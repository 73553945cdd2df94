//! Tests for the search engine run loop

use super::*;
use crate::platform::testing::{FakePointer, FakeScreen, PointerAction};
use crate::template_matching::{Matcher, Template};
use image::{Rgba, RgbaImage};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, sleep, timeout};

/// Deterministic high-entropy pixels so every crop occurs exactly once
fn noise(width: u32, height: u32, seed: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77) ^ seed;
        h ^= h >> 15;
        h = h.wrapping_mul(0x2C1B_3C6D);
        h ^= h >> 12;
        let [r, g, b, _] = h.to_le_bytes();
        Rgba([r, g, b, 255])
    })
}

fn crop(frame: &RgbaImage, x: u32, y: u32, w: u32, h: u32, name: &str) -> Arc<Template> {
    let bitmap = image::imageops::crop_imm(frame, x, y, w, h).to_image();
    Arc::new(Template::from_image(name, bitmap).unwrap())
}

struct Rig {
    engine: SearchEngine,
    events: EventReceiver,
    screen: Arc<FakeScreen>,
    pointer: Arc<FakePointer>,
}

fn rig(frame: RgbaImage) -> Rig {
    rig_with(FakeScreen::new(frame))
}

fn rig_with(screen: FakeScreen) -> Rig {
    rig_from(screen, FakePointer::at(Point::new(5, 5)), Matcher::exact())
}

fn rig_from(screen: FakeScreen, pointer: FakePointer, matcher: Matcher) -> Rig {
    let screen = Arc::new(screen);
    let pointer = Arc::new(pointer);
    let (tx, rx) = create_event_channel();
    let engine = SearchEngine::new(
        Handle::current(),
        screen.clone(),
        pointer.clone(),
        matcher,
        tx,
    );
    Rig {
        engine,
        events: rx,
        screen,
        pointer,
    }
}

/// 200x200 region with its origin at (500, 300)
fn settings() -> Settings {
    Settings {
        region: Some(Region::new(500, 300, 700, 500).unwrap()),
        poll_delay: 5.0,
        ..Settings::default()
    }
}

async fn collect_until(
    rx: &mut EventReceiver,
    mut done: impl FnMut(&StatusEvent) -> bool,
) -> Vec<StatusEvent> {
    let mut seen = Vec::new();
    timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            let finished = done(&event);
            seen.push(event);
            if finished {
                break;
            }
        }
    })
    .await
    .expect("timed out waiting for status event");
    seen
}

fn drain(rx: &mut EventReceiver) -> Vec<StatusEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = rx.try_recv() {
        seen.push(event);
    }
    seen
}

async fn wait_idle(engine: &SearchEngine, limit: Duration) -> Duration {
    let begun = Instant::now();
    timeout(limit, async {
        while engine.state() != RunState::Idle {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("engine did not reach Idle in time");
    begun.elapsed()
}

#[tokio::test]
async fn test_clicks_center_of_match_in_screen_coordinates() {
    let frame = noise(200, 200, 1);
    let template = crop(&frame, 100, 100, 40, 20, "button.png");
    let mut rig = rig(frame);

    rig.engine
        .start(settings().snapshot(vec![template.clone()]).unwrap())
        .await
        .unwrap();
    let events = collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;
    rig.engine.stop();
    rig.engine.join().await;

    let target = Point::new(620, 410);
    assert_eq!(events[0], StatusEvent::Started);
    assert_eq!(
        events[1],
        StatusEvent::FoundAt {
            point: target,
            template: template.id(),
            name: "button.png".to_string(),
            score: None,
        }
    );
    assert_eq!(events[2], StatusEvent::Clicked(target));
    assert_eq!(
        rig.pointer.actions(),
        vec![PointerAction::MoveTo(target), PointerAction::Click]
    );
    assert_eq!(drain(&mut rig.events), vec![StatusEvent::Stopped]);
    assert_eq!(rig.engine.state(), RunState::Idle);
}

#[tokio::test]
async fn test_first_template_in_order_wins() {
    let frame = noise(200, 200, 2);
    let early = crop(&frame, 10, 10, 20, 20, "early.png");
    let late = crop(&frame, 120, 150, 20, 20, "late.png");
    let mut rig = rig(frame);

    rig.engine
        .start(settings().snapshot(vec![late.clone(), early.clone()]).unwrap())
        .await
        .unwrap();
    let events = collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;
    rig.engine.stop();
    rig.engine.join().await;

    let found: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            StatusEvent::FoundAt { template, point, .. } => Some((*template, *point)),
            _ => None,
        })
        .collect();
    assert_eq!(found, vec![(late.id(), Point::new(500 + 130, 300 + 160))]);
}

#[tokio::test]
async fn test_preview_only_never_clicks() {
    let frame = noise(200, 200, 3);
    let template = crop(&frame, 50, 60, 10, 10, "t.png");
    let mut rig = rig(frame);
    let preview = Settings {
        poll_delay: 0.01,
        preview_only: true,
        restore_mouse: true,
        ..settings()
    };

    rig.engine
        .start(preview.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    let mut moves = 0;
    collect_until(&mut rig.events, |e| {
        assert!(!matches!(e, StatusEvent::Clicked(_)));
        if matches!(e, StatusEvent::Moved(_)) {
            moves += 1;
        }
        moves >= 3
    })
    .await;
    rig.engine.stop();
    rig.engine.join().await;

    let target = Point::new(500 + 55, 300 + 65);
    assert_eq!(rig.pointer.clicks(), 0);
    for action in rig.pointer.actions() {
        match action {
            PointerAction::Position => {}
            PointerAction::MoveTo(point) => assert_eq!(point, target),
            PointerAction::Click => panic!("clicked in preview mode"),
        }
    }
}

#[tokio::test]
async fn test_restore_mouse_returns_pointer() {
    let frame = noise(200, 200, 4);
    let template = crop(&frame, 0, 0, 8, 8, "corner.png");
    let mut rig = rig(frame);
    let restoring = Settings {
        restore_mouse: true,
        ..settings()
    };

    rig.engine
        .start(restoring.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;
    rig.engine.stop();
    rig.engine.join().await;

    assert_eq!(
        rig.pointer.actions(),
        vec![
            PointerAction::Position,
            PointerAction::MoveTo(Point::new(504, 304)),
            PointerAction::Click,
            PointerAction::MoveTo(Point::new(5, 5)),
        ]
    );
}

#[tokio::test]
async fn test_not_found_leaves_pointer_alone() {
    let template = crop(&noise(50, 50, 99), 0, 0, 10, 10, "elsewhere.png");
    let mut rig = rig(noise(200, 200, 5));

    rig.engine
        .start(settings().snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    let events = collect_until(&mut rig.events, |e| *e == StatusEvent::NotFound).await;
    rig.engine.stop();
    rig.engine.join().await;

    assert_eq!(events, vec![StatusEvent::Started, StatusEvent::NotFound]);
    assert!(rig.pointer.actions().is_empty());
}

#[tokio::test]
async fn test_stop_right_after_start_is_prompt() {
    let frame = noise(200, 200, 6);
    let template = crop(&frame, 20, 20, 10, 10, "t.png");
    let mut rig = rig(frame);
    let slow = Settings {
        poll_delay: 10.0,
        post_find_delay: 10.0,
        pre_click_delay: 10.0,
        ..settings()
    };

    rig.engine
        .start(slow.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    rig.engine.stop();

    let took = wait_idle(&rig.engine, Duration::from_millis(500)).await;
    assert!(took <= Duration::from_millis(200), "took {took:?}");
    rig.engine.join().await;
    assert_eq!(drain(&mut rig.events).last(), Some(&StatusEvent::Stopped));
}

#[tokio::test]
async fn test_stop_interrupts_post_find_delay() {
    let frame = noise(200, 200, 7);
    let template = crop(&frame, 20, 20, 10, 10, "t.png");
    let mut rig = rig(frame);
    let slow = Settings {
        poll_delay: 10.0,
        post_find_delay: 10.0,
        ..settings()
    };

    rig.engine
        .start(slow.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    collect_until(&mut rig.events, |e| {
        matches!(
            e,
            StatusEvent::Waiting {
                phase: WaitPhase::BeforeMove,
                ..
            }
        )
    })
    .await;
    rig.engine.stop();

    let took = wait_idle(&rig.engine, Duration::from_millis(500)).await;
    assert!(took <= STOP_SLICE * 2, "took {took:?}");
    rig.engine.join().await;
    assert!(rig.pointer.actions().is_empty(), "no action after stop");
}

#[tokio::test]
async fn test_capture_failures_are_reported_and_survived() {
    let frame = noise(200, 200, 8);
    let template = crop(&frame, 30, 40, 12, 12, "t.png");
    let mut rig = rig_with(FakeScreen::new(frame).failing_first(2));
    let fast = Settings {
        poll_delay: 0.01,
        ..settings()
    };

    rig.engine
        .start(fast.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    let events =
        collect_until(&mut rig.events, |e| matches!(e, StatusEvent::FoundAt { .. })).await;
    rig.engine.stop();
    rig.engine.join().await;

    let errors = events
        .iter()
        .filter(|e| matches!(e, StatusEvent::Error(msg) if msg.contains("screen locked")))
        .count();
    assert_eq!(errors, 2);
    assert!(rig.screen.captures() >= 3);
}

#[tokio::test]
async fn test_start_without_templates_stays_idle() {
    let mut rig = rig(noise(10, 10, 9));

    let err = settings().snapshot(Vec::new()).unwrap_err();
    assert!(err.is_configuration());

    let bare = RunSnapshot {
        region: Region::new(0, 0, 10, 10).unwrap(),
        templates: Vec::new(),
        confidence: 0.8,
        poll_delay: Duration::ZERO,
        pre_click_delay: Duration::ZERO,
        post_find_delay: Duration::ZERO,
        preview_only: false,
        restore_mouse: false,
    };
    assert!(rig.engine.start(bare).await.unwrap_err().is_configuration());
    assert_eq!(rig.engine.state(), RunState::Idle);
    assert!(drain(&mut rig.events).is_empty());
}

#[tokio::test]
async fn test_stop_while_idle_is_noop() {
    let mut rig = rig(noise(10, 10, 10));
    rig.engine.stop();
    rig.engine.join().await;
    assert_eq!(rig.engine.state(), RunState::Idle);
    assert!(drain(&mut rig.events).is_empty());
}

#[tokio::test]
async fn test_restart_replaces_active_loop() {
    let frame = noise(200, 200, 11);
    let template = crop(&frame, 20, 20, 10, 10, "t.png");
    let mut rig = rig(frame);

    rig.engine
        .start(settings().snapshot(vec![template.clone()]).unwrap())
        .await
        .unwrap();
    collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;

    rig.engine
        .start(settings().snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    assert_eq!(rig.engine.state(), RunState::Running);
    let events = collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;
    rig.engine.stop();
    rig.engine.join().await;

    assert_eq!(events[0], StatusEvent::Stopped);
    assert_eq!(events[1], StatusEvent::Started);
    assert_eq!(drain(&mut rig.events), vec![StatusEvent::Stopped]);
    assert_eq!(rig.pointer.clicks(), 2);
}

#[tokio::test]
async fn test_frame_changes_between_iterations() {
    let target = noise(200, 200, 12);
    let template = crop(&target, 70, 80, 16, 16, "t.png");
    let mut rig = rig(noise(200, 200, 13));
    let fast = Settings {
        poll_delay: 0.01,
        ..settings()
    };

    rig.engine
        .start(fast.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    collect_until(&mut rig.events, |e| *e == StatusEvent::NotFound).await;
    rig.screen.set_frame(target);
    collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;
    rig.engine.stop();
    rig.engine.join().await;

    assert_eq!(rig.pointer.clicks(), 1);
}

#[tokio::test]
async fn test_input_failures_are_reported_and_survived() {
    let frame = noise(200, 200, 14);
    let template = crop(&frame, 30, 40, 12, 12, "t.png");
    let mut rig = rig_from(
        FakeScreen::new(frame),
        FakePointer::at(Point::new(5, 5)).failing_first(1),
        Matcher::exact(),
    );
    let fast = Settings {
        poll_delay: 0.01,
        ..settings()
    };

    rig.engine
        .start(fast.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    let events = collect_until(&mut rig.events, |e| matches!(e, StatusEvent::Clicked(_))).await;
    rig.engine.stop();
    rig.engine.join().await;

    let failed_at = events
        .iter()
        .position(|e| matches!(e, StatusEvent::Error(msg) if msg.contains("input device unplugged")))
        .expect("input failure reported");
    assert!(failed_at < events.len() - 1);
    assert_eq!(rig.pointer.clicks(), 1);
    assert_eq!(rig.engine.state(), RunState::Idle);
}

#[tokio::test]
async fn test_endless_delay_still_stops() {
    let frame = noise(200, 200, 15);
    let template = crop(&frame, 20, 20, 10, 10, "t.png");
    let mut rig = rig(frame);
    let endless = Settings {
        post_find_delay: 1e30,
        ..settings()
    };

    rig.engine
        .start(endless.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    collect_until(&mut rig.events, |e| {
        matches!(
            e,
            StatusEvent::Waiting {
                phase: WaitPhase::BeforeMove,
                ..
            }
        )
    })
    .await;
    sleep(STOP_SLICE * 2).await;
    assert_eq!(rig.engine.state(), RunState::Running);
    rig.engine.stop();

    let took = wait_idle(&rig.engine, Duration::from_millis(500)).await;
    assert!(took <= STOP_SLICE * 2, "took {took:?}");
    rig.engine.join().await;
    assert!(rig.pointer.actions().is_empty());
}

#[cfg(feature = "correlation")]
#[tokio::test]
async fn test_confidence_change_applies_on_next_iteration() {
    let frame = noise(80, 80, 16);
    // Top half copied from the frame, bottom half unrelated: scores about 0.5
    let other = noise(20, 20, 17);
    let half = RgbaImage::from_fn(20, 20, |x, y| {
        if y < 10 {
            *frame.get_pixel(x + 40, y + 30)
        } else {
            *other.get_pixel(x, y)
        }
    });
    let template = Arc::new(Template::from_image("half.png", half).unwrap());
    let mut rig = rig_from(
        FakeScreen::new(frame),
        FakePointer::at(Point::new(5, 5)),
        Matcher::correlation(),
    );
    let lenient = Settings {
        confidence: 0.3,
        poll_delay: 0.02,
        ..settings()
    };

    rig.engine
        .start(lenient.snapshot(vec![template]).unwrap())
        .await
        .unwrap();
    let events =
        collect_until(&mut rig.events, |e| matches!(e, StatusEvent::FoundAt { .. })).await;
    let Some(StatusEvent::FoundAt {
        point,
        score: Some(score),
        ..
    }) = events.last()
    else {
        panic!("expected a scored match, got {events:?}");
    };
    assert!(*score > 0.3 && *score < 0.95, "score {score}");
    assert_eq!(*point, Point::new(500 + 50, 300 + 40));

    rig.engine.set_confidence(0.95);
    collect_until(&mut rig.events, |e| *e == StatusEvent::NotFound).await;

    rig.engine.set_confidence(0.3);
    collect_until(&mut rig.events, |e| matches!(e, StatusEvent::FoundAt { .. })).await;
    rig.engine.stop();
    rig.engine.join().await;
}
