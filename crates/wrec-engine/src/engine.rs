//! Binds the document, recorder, player, and channel behind a single
//! dispatch point.

use std::sync::Arc;

use tracing::debug;
use wrec_common::origin::same_origin;
use wrec_common::protocol::{Command, Envelope, Notification, Step};

use crate::channel::{Emitter, MessageChannel};
use crate::clock::{Clock, WallClock};
use crate::config::EngineConfig;
use crate::dom::{Document, Event, NodeId};
use crate::playback::{InteractionDriver, PlaybackState, Player};
use crate::recorder::Recorder;

pub struct Engine {
    doc: Document,
    recorder: Recorder,
    player: Player,
    channel: Box<dyn MessageChannel>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(doc: Document, channel: Box<dyn MessageChannel>, config: EngineConfig) -> Self {
        Self::with_clock(doc, channel, config, Arc::new(WallClock))
    }

    pub fn with_clock(
        doc: Document,
        channel: Box<dyn MessageChannel>,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            doc,
            recorder: Recorder::new(clock.clone()),
            player: Player::new(config.timing.clone(), clock),
            channel,
            config,
        }
    }

    pub fn set_driver(&mut self, driver: Arc<dyn InteractionDriver>) {
        self.player.set_driver(driver);
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn steps(&self) -> &[Step] {
        self.recorder.steps()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.player.state()
    }

    /// Announce readiness to the embedding controller. Callers must wait for
    /// this before issuing commands.
    pub fn announce_ready(&mut self) {
        self.emit(Notification::RecorderReady);
    }

    /// Entry point for page activity. The recorder observes first (the
    /// capturing phase at the document level), then the event runs through
    /// normal document dispatch.
    pub fn deliver_event(&mut self, target: NodeId, event: Event) {
        if let Some(step) = self.recorder.observe(&self.doc, target, &event) {
            self.emit(Notification::StepRecorded { step });
        }
        self.doc.dispatch(target, event);
    }

    /// Handle one inbound envelope. Messages from a foreign origin, and
    /// malformed or unknown payloads, are dropped silently.
    pub async fn handle_message(&mut self, sender_origin: &str, envelope: Envelope) {
        if !same_origin(sender_origin, self.channel.origin()) {
            debug!(sender_origin, "dropping cross-origin message");
            return;
        }

        let command = match Command::from_envelope(&envelope) {
            Ok(command) => command,
            Err(err) => {
                debug!(action = %envelope.action, %err, "dropping message");
                return;
            }
        };

        match command {
            Command::StartRecording => {
                if self.recorder.start(&mut self.doc) {
                    self.emit(Notification::RecordingStarted);
                }
            }
            Command::StopRecording => {
                if let Some(steps) = self.recorder.stop(&mut self.doc) {
                    self.emit(Notification::RecordingStopped { steps });
                }
            }
            Command::GetSteps => {
                self.emit(Notification::StepsUpdate {
                    steps: self.recorder.steps().to_vec(),
                });
            }
            Command::PlayRecording { steps } => {
                let Engine {
                    doc,
                    player,
                    channel,
                    config,
                    ..
                } = self;
                let mut emitter = Emitter::new(channel.as_mut(), &config.source);
                player.play(doc, &steps, &mut emitter).await;
            }
        }
    }

    /// Guaranteed teardown: stops any active recording and reports the
    /// final buffer.
    pub fn shutdown(&mut self) {
        if let Some(steps) = self.recorder.stop(&mut self.doc) {
            self.emit(Notification::RecordingStopped { steps });
        }
    }

    fn emit(&mut self, notification: Notification) {
        Emitter::new(self.channel.as_mut(), &self.config.source).emit(notification);
    }
}
