//! End-to-end playback behavior through the public API: pause/resume
//! transparency, restart and cancellation semantics, and live extraction.

use std::time::{Duration, Instant};

use serde_json::json;
use tokio::time::sleep;

use vizstream_core::{
    parse_dump, ChartUpdate, FixedPacer, PacerHandle, Player, PlayerConfig, PlayerStatus,
    SpecSource, StreamEvent, VizstreamError,
};

const WAIT: Duration = Duration::from_secs(5);

fn fast_player() -> Player {
    let config = PlayerConfig {
        pause_poll_ms: 5,
        min_delay_ms: 1,
        ..PlayerConfig::default()
    };
    Player::with_pacer(config, PacerHandle::new(FixedPacer(1)))
}

fn token(delta: &str) -> StreamEvent {
    StreamEvent::Token {
        delta: delta.into(),
    }
}

fn numbered_tokens(count: usize) -> Vec<StreamEvent> {
    (0..count).map(|i| token(&format!("t{i} "))).collect()
}

fn concatenated_deltas(events: &[StreamEvent]) -> String {
    events
        .iter()
        .filter_map(|ev| match ev {
            StreamEvent::Token { delta } => Some(delta.as_str()),
            _ => None,
        })
        .collect()
}

async fn await_status(player: &Player, want: PlayerStatus) {
    let start = Instant::now();
    loop {
        let current = player.status();
        if current == want {
            return;
        }
        if start.elapsed() >= WAIT {
            panic!("timed out waiting for {want:?}, still {current:?}");
        }
        sleep(Duration::from_millis(5)).await;
    }
}

async fn await_cursor_at_least(player: &Player, min: usize) {
    let start = Instant::now();
    loop {
        if player.snapshot().cursor.is_some_and(|c| c >= min) {
            return;
        }
        if start.elapsed() >= WAIT {
            panic!(
                "timed out waiting for cursor >= {min}, still {:?}",
                player.snapshot().cursor
            );
        }
        sleep(Duration::from_millis(2)).await;
    }
}

/// The recorded-dump scenario: two token deltas forming a fenced spec, then
/// a done marker.
fn fenced_spec_dump() -> Vec<StreamEvent> {
    let dump = concat!(
        r#"{"event":"token","data":{"delta":"```json\n{\"mark\""}}"#,
        "\n",
        r#"{"event":"token","data":{"delta":":\"bar\",\"encoding\":{}}\n```"}}"#,
        "\n",
        r#"{"event":"done","data":{}}"#,
        "\n",
    );
    parse_dump(dump)
}

#[tokio::test]
async fn full_playback_extracts_the_fenced_spec_and_ends_done() {
    let events = fenced_spec_dump();
    assert_eq!(events.len(), 3);
    let expected_text = concatenated_deltas(&events);

    let player = fast_player();
    let mut chart_rx = player.subscribe_chart();
    player.load_events(events);
    player.play().expect("play");

    await_status(&player, PlayerStatus::Done).await;

    let snap = player.snapshot();
    assert_eq!(snap.text, expected_text);
    assert_eq!(snap.cursor, Some(2));

    let chart = snap.chart.expect("spec must be extracted");
    assert_eq!(chart.source, SpecSource::Fenced);
    assert_eq!(chart.spec, json!({"mark": "bar", "encoding": {}}));
    assert_eq!(chart.raw, "{\"mark\":\"bar\",\"encoding\":{}}");
    assert!(snap.hint.is_none());

    let update = chart_rx.recv().await.expect("chart event");
    assert!(matches!(update.update, ChartUpdate::Spec { .. }));
}

#[tokio::test]
async fn pause_resume_is_observationally_transparent() {
    let events = numbered_tokens(20);
    let expected = concatenated_deltas(&events);

    // Straight run for reference.
    let reference = fast_player();
    reference.load_events(events.clone());
    reference.play().expect("play");
    await_status(&reference, PlayerStatus::Done).await;
    assert_eq!(reference.snapshot().text, expected);

    // Interrupted run: pause somewhere in the middle, then resume.
    let player = fast_player();
    player.load_events(events.clone());
    player.play().expect("play");

    await_cursor_at_least(&player, 4).await;
    player.pause().expect("pause");
    assert_eq!(player.status(), PlayerStatus::Paused);

    // Wait out a few poll intervals: the pass must stay parked.
    sleep(Duration::from_millis(60)).await;
    let at_pause = player.snapshot();
    let cursor = at_pause.cursor.expect("cursor after pause");

    // The accumulator equals exactly the deltas processed so far.
    assert_eq!(at_pause.text, concatenated_deltas(&events[..=cursor]));

    sleep(Duration::from_millis(40)).await;
    assert_eq!(
        player.snapshot().text,
        at_pause.text,
        "no accumulation while paused"
    );

    player.resume().expect("resume");
    await_status(&player, PlayerStatus::Done).await;

    // Pause/resume is invisible in the final output.
    assert_eq!(player.snapshot().text, expected);
}

#[tokio::test]
async fn restart_replays_from_scratch_after_done() {
    let events = numbered_tokens(5);
    let expected = concatenated_deltas(&events);

    let player = fast_player();
    player.load_events(events);
    player.play().expect("first play");
    await_status(&player, PlayerStatus::Done).await;
    assert_eq!(player.snapshot().text, expected);
    assert!(player.can_play());

    player.play().expect("replay");
    await_status(&player, PlayerStatus::Done).await;

    let snap = player.snapshot();
    assert_eq!(snap.text, expected, "second pass must not double-append");
    assert_eq!(snap.cursor, Some(4));
}

#[tokio::test]
async fn restart_after_stream_error_resets_error_state() {
    let mut events = numbered_tokens(2);
    events.push(StreamEvent::Error {
        message: "upstream failure".into(),
    });
    events.push(token("never delivered"));

    let player = fast_player();
    player.load_events(events);
    player.play().expect("play");
    await_status(&player, PlayerStatus::Errored).await;

    let snap = player.snapshot();
    assert_eq!(snap.error.as_deref(), Some("upstream failure"));
    assert_eq!(snap.text, "t0 t1 ");
    assert!(player.can_play(), "errored is terminal but restartable");

    player.play().expect("restart");
    // The error is cleared at restart and re-recorded when the pass hits
    // the error event again.
    await_status(&player, PlayerStatus::Errored).await;
    assert_eq!(player.snapshot().text, "t0 t1 ");
}

#[tokio::test]
async fn stop_cancels_without_further_accumulation() {
    let player = fast_player();
    player.load_events(numbered_tokens(200));
    player.play().expect("play");

    await_cursor_at_least(&player, 3).await;
    player.stop().expect("stop");
    await_status(&player, PlayerStatus::Idle).await;

    let stopped = player.snapshot();
    sleep(Duration::from_millis(50)).await;
    assert_eq!(
        player.snapshot().text,
        stopped.text,
        "no mutation after stop took effect"
    );
    assert!(matches!(player.stop(), Err(VizstreamError::NotRunning)));
}

#[tokio::test]
async fn play_is_rejected_while_a_pass_is_active() {
    let player = fast_player();
    player.load_events(numbered_tokens(100));
    player.play().expect("play");

    assert!(matches!(player.play(), Err(VizstreamError::AlreadyRunning)));

    player.stop().expect("stop");
    await_status(&player, PlayerStatus::Idle).await;
}

#[tokio::test]
async fn stop_wins_over_a_pending_pause() {
    let player = fast_player();
    player.load_events(numbered_tokens(100));
    player.play().expect("play");

    await_cursor_at_least(&player, 1).await;
    player.pause().expect("pause");
    player.stop().expect("stop");

    await_status(&player, PlayerStatus::Idle).await;
}

#[tokio::test]
async fn loading_a_new_dump_abandons_the_running_pass() {
    let player = fast_player();
    player.load_events(numbered_tokens(200));
    player.play().expect("play");
    await_cursor_at_least(&player, 1).await;

    player.load_events(vec![token("fresh "), token("log")]);

    let snap = player.snapshot();
    assert_eq!(snap.status, PlayerStatus::Idle);
    assert!(snap.text.is_empty(), "session reset with the new log");
    assert_eq!(snap.cursor, None);

    // The abandoned pass releases its guard at the next checkpoint; play()
    // then runs the new sequence only.
    let start = Instant::now();
    loop {
        match player.play() {
            Ok(()) => break,
            Err(VizstreamError::AlreadyRunning) if start.elapsed() < WAIT => {
                sleep(Duration::from_millis(5)).await;
            }
            Err(e) => panic!("unexpected play error: {e}"),
        }
    }

    await_status(&player, PlayerStatus::Done).await;
    assert_eq!(player.snapshot().text, "fresh log");
}

#[tokio::test]
async fn speed_changes_timing_but_not_output() {
    let events = numbered_tokens(10);
    let expected = concatenated_deltas(&events);

    let player = fast_player();
    player.set_speed(4.0);
    player.load_events(events);
    player.play().expect("play");
    await_status(&player, PlayerStatus::Done).await;

    assert_eq!(player.snapshot().text, expected);
    assert_eq!(player.speed(), 4.0);
}

#[tokio::test]
async fn capabilities_track_the_lifecycle() {
    let player = fast_player();
    assert!(!player.can_play());

    player.load_events(numbered_tokens(100));
    assert!(player.can_play());
    assert!(!player.can_resume());

    player.play().expect("play");
    assert!(player.can_pause());
    assert!(player.can_stop());
    assert!(!player.can_play());

    await_cursor_at_least(&player, 0).await;
    player.pause().expect("pause");
    assert!(player.can_resume());
    assert!(player.can_stop());
    assert!(!player.can_pause());

    player.stop().expect("stop");
    await_status(&player, PlayerStatus::Idle).await;
    assert!(player.can_play());
}

#[tokio::test]
async fn braced_spec_in_prose_is_extracted_with_braced_source() {
    let player = fast_player();
    player.load_events(vec![
        token("Sure! Here is the chart: {\"mark\": \"line\", "),
        token("\"encoding\": {\"x\": {\"field\": \"a}b\"}}}"),
        StreamEvent::Done(json!({})),
    ]);
    player.play().expect("play");
    await_status(&player, PlayerStatus::Done).await;

    let chart = player.snapshot().chart.expect("chart extracted");
    assert_eq!(chart.source, SpecSource::Braced);
    assert_eq!(
        chart.raw,
        "{\"mark\": \"line\", \"encoding\": {\"x\": {\"field\": \"a}b\"}}}"
    );
}
