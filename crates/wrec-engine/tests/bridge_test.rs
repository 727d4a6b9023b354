//! Messaging bridge: readiness, origin filtering, and command round-trips.

use std::sync::Arc;

use wrec_engine::channel::{InProcessChannel, Outbox};
use wrec_engine::clock::ManualClock;
use wrec_engine::config::EngineConfig;
use wrec_engine::dom::{Document, Event, NodeId};
use wrec_engine::engine::Engine;
use wrec_engine::protocol::{Command, Envelope, Notification};

const ORIGIN: &str = "https://app.example.com";

fn page() -> (Document, NodeId) {
    let mut doc = Document::new();
    let body = doc.create_element("body");
    doc.append_child(doc.root(), body);
    let button = doc.create_element("button");
    doc.set_id(button, "go");
    doc.set_text(button, "Go");
    doc.append_child(body, button);
    (doc, button)
}

fn engine_with(doc: Document) -> (Engine, Outbox) {
    let channel = InProcessChannel::new(ORIGIN);
    let outbox = channel.outbox();
    let engine = Engine::with_clock(
        doc,
        Box::new(channel),
        EngineConfig::with_origin(ORIGIN),
        Arc::new(ManualClock::new(0)),
    );
    (engine, outbox)
}

fn command(cmd: Command) -> Envelope {
    cmd.into_envelope("controller")
}

#[tokio::test]
async fn readiness_is_announced_before_anything_else() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine.announce_ready();
    engine.handle_message(ORIGIN, command(Command::StartRecording)).await;

    let actions = outbox.actions();
    assert_eq!(actions[0], "RECORDER_READY");
    assert_eq!(actions[1], "RECORDING_STARTED");
}

#[tokio::test]
async fn outbound_envelopes_carry_the_engine_source_tag() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine.announce_ready();
    let envelopes = outbox.snapshot();
    assert_eq!(envelopes[0].source, "wrec-recorder");
}

#[tokio::test]
async fn foreign_origin_messages_are_dropped_silently() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine
        .handle_message("https://evil.example.com", command(Command::StartRecording))
        .await;

    assert!(!engine.is_recording());
    assert!(outbox.snapshot().is_empty());
}

#[tokio::test]
async fn same_host_different_port_or_scheme_is_foreign() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine
        .handle_message("https://app.example.com:8443", command(Command::StartRecording))
        .await;
    engine
        .handle_message("http://app.example.com", command(Command::StartRecording))
        .await;

    assert!(!engine.is_recording());
    assert!(outbox.snapshot().is_empty());
}

#[tokio::test]
async fn unknown_actions_are_dropped_without_a_reply() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    let envelope = Envelope {
        action: "REBOOT".to_string(),
        data: serde_json::json!({}),
        source: "controller".to_string(),
    };
    engine.handle_message(ORIGIN, envelope).await;
    assert!(outbox.snapshot().is_empty());
}

#[tokio::test]
async fn malformed_play_payload_is_dropped_without_starting_playback() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    let envelope = Envelope {
        action: "PLAY_RECORDING".to_string(),
        data: serde_json::json!({ "steps": "not-a-list" }),
        source: "controller".to_string(),
    };
    engine.handle_message(ORIGIN, envelope).await;
    assert!(outbox.snapshot().is_empty());
}

#[tokio::test]
async fn get_steps_reports_the_live_buffer() {
    let (doc, button) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine.handle_message(ORIGIN, command(Command::StartRecording)).await;
    engine.deliver_event(button, Event::new("click"));
    engine.handle_message(ORIGIN, command(Command::GetSteps)).await;

    let envelopes = outbox.snapshot();
    let update = Notification::from_envelope(envelopes.last().unwrap()).unwrap();
    let Notification::StepsUpdate { steps } = update else {
        panic!("expected StepsUpdate");
    };
    assert_eq!(steps, engine.steps());
}

#[tokio::test]
async fn record_then_stop_round_trips_the_session_over_the_wire() {
    let (doc, button) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine.announce_ready();
    engine.handle_message(ORIGIN, command(Command::StartRecording)).await;
    engine.deliver_event(button, Event::new("click"));
    engine.handle_message(ORIGIN, command(Command::StopRecording)).await;

    assert_eq!(
        outbox.actions(),
        vec![
            "RECORDER_READY",
            "RECORDING_STARTED",
            "STEP_RECORDED",
            "RECORDING_STOPPED",
        ]
    );

    let envelopes = outbox.snapshot();
    let stopped = Notification::from_envelope(envelopes.last().unwrap()).unwrap();
    let Notification::RecordingStopped { steps } = stopped else {
        panic!("expected RecordingStopped");
    };
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].selector(), "#go");
}

#[tokio::test]
async fn shutdown_tears_down_an_active_recording() {
    let (doc, _) = page();
    let (mut engine, outbox) = engine_with(doc);

    engine.handle_message(ORIGIN, command(Command::StartRecording)).await;
    engine.shutdown();

    assert!(!engine.is_recording());
    let root = engine.document().root();
    assert!(!engine.document().inline_style(root).contains("outline"));
    assert!(outbox.actions().contains(&"RECORDING_STOPPED".to_string()));
}
