//! The message channel seam between the engine and its embedding controller.
//!
//! The engine only ever talks through [`MessageChannel`], so tests (and
//! alternative hosts) plug in an in-process channel instead of a real
//! cross-window transport.

use std::sync::{Arc, Mutex};

use tracing::warn;
use wrec_common::error::ChannelError;
use wrec_common::protocol::{Envelope, Notification};

pub trait MessageChannel: Send {
    /// Deliver one outbound envelope to the embedding controller.
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelError>;

    /// The page's own origin. Outbound messages are scoped to it; inbound
    /// messages are checked against it with strict equality.
    fn origin(&self) -> &str;
}

/// In-process channel: everything sent stays readable through the shared
/// [`Outbox`] handle, even after the channel moves into an engine.
pub struct InProcessChannel {
    origin: String,
    outbox: Outbox,
}

impl InProcessChannel {
    pub fn new(origin: &str) -> Self {
        Self {
            origin: origin.to_string(),
            outbox: Outbox::default(),
        }
    }

    pub fn outbox(&self) -> Outbox {
        self.outbox.clone()
    }
}

impl MessageChannel for InProcessChannel {
    fn send(&mut self, envelope: Envelope) -> Result<(), ChannelError> {
        self.outbox.push(envelope);
        Ok(())
    }

    fn origin(&self) -> &str {
        &self.origin
    }
}

/// Shared view over the envelopes an [`InProcessChannel`] has sent.
#[derive(Clone, Default)]
pub struct Outbox(Arc<Mutex<Vec<Envelope>>>);

impl Outbox {
    fn push(&self, envelope: Envelope) {
        self.0.lock().unwrap().push(envelope);
    }

    pub fn snapshot(&self) -> Vec<Envelope> {
        self.0.lock().unwrap().clone()
    }

    pub fn drain(&self) -> Vec<Envelope> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    /// Action names of everything sent so far, in order.
    pub fn actions(&self) -> Vec<String> {
        self.0.lock().unwrap().iter().map(|e| e.action.clone()).collect()
    }
}

/// Stamps notifications with the engine source tag and sends them.
/// Send failures are logged, never propagated: lifecycle announcements must
/// not fault the host page.
pub struct Emitter<'a> {
    channel: &'a mut dyn MessageChannel,
    source: &'a str,
}

impl<'a> Emitter<'a> {
    pub fn new(channel: &'a mut dyn MessageChannel, source: &'a str) -> Self {
        Self { channel, source }
    }

    pub fn emit(&mut self, notification: Notification) {
        let action = notification.action();
        if let Err(err) = self.channel.send(notification.into_envelope(self.source)) {
            warn!(action, %err, "failed to send notification");
        }
    }
}
