//! Event capture controller: owns the recording state machine and the
//! session step buffer.

use std::sync::Arc;

use tracing::{debug, info};
use wrec_common::protocol::Step;

use crate::clock::Clock;
use crate::dom::{Document, Event, NodeId};
use crate::selector;

/// Inline style applied to the document root while recording.
const INDICATOR_STYLE: &str = "outline: 3px solid #e53935; outline-offset: -3px;";

const MAX_CLICK_TEXT_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
}

pub struct Recorder {
    state: RecorderState,
    session: Vec<Step>,
    saved_root_style: Option<String>,
    clock: Arc<dyn Clock>,
}

impl Recorder {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: RecorderState::Idle,
            session: Vec::new(),
            saved_root_style: None,
            clock,
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    /// Current step buffer, read-only.
    pub fn steps(&self) -> &[Step] {
        &self.session
    }

    /// Idle → Recording: clear the buffer, attach the capture hooks, apply
    /// the recording indicator. Returns false (no-op) when already recording.
    pub fn start(&mut self, doc: &mut Document) -> bool {
        if self.is_recording() {
            return false;
        }
        self.session.clear();
        let root = doc.root();
        self.saved_root_style = Some(doc.inline_style(root).to_string());
        doc.set_inline_style(root, INDICATOR_STYLE);
        self.state = RecorderState::Recording;
        info!("recording started");
        true
    }

    /// Recording → Idle: detach hooks, restore the root style, hand back the
    /// finalized session. Returns None (no-op) when already idle.
    pub fn stop(&mut self, doc: &mut Document) -> Option<Vec<Step>> {
        if !self.is_recording() {
            return None;
        }
        if let Some(style) = self.saved_root_style.take() {
            doc.set_inline_style(doc.root(), &style);
        }
        self.state = RecorderState::Idle;
        info!(steps = self.session.len(), "recording stopped");
        Some(self.session.clone())
    }

    /// Capturing-phase observation of one page event. Runs before the
    /// document's own dispatch, so a bubble-phase stop-propagation cannot
    /// hide the event. Returns the appended step, if any, for the per-step
    /// notification.
    pub fn observe(&mut self, doc: &Document, target: NodeId, event: &Event) -> Option<Step> {
        if !self.is_recording() || !event.trusted {
            return None;
        }
        let step = match event.name.as_str() {
            "click" => self.capture_click(doc, target),
            "input" => self.capture_input(doc, target),
            "keydown" => self.capture_keypress(doc, target, event)?,
            _ => return None,
        };
        debug!(selector = step.selector(), kind = ?event.name, "step recorded");
        self.session.push(step.clone());
        Some(step)
    }

    fn capture_click(&self, doc: &Document, target: NodeId) -> Step {
        let trimmed: String = doc
            .text_content(target)
            .trim()
            .chars()
            .take(MAX_CLICK_TEXT_CHARS)
            .collect();
        let text = if !trimmed.is_empty() {
            trimmed
        } else if !doc.value(target).is_empty() {
            doc.value(target).to_string()
        } else {
            "element".to_string()
        };
        Step::Click {
            selector: selector::synthesize(doc, target),
            timestamp: self.clock.now_ms(),
            text,
            tag_name: doc.tag_name(target).to_string(),
        }
    }

    fn capture_input(&mut self, doc: &Document, target: NodeId) -> Step {
        let selector = selector::synthesize(doc, target);
        // One Input entry per selector: drop the stale edit so the field's
        // latest value lands at the current tail.
        self.session
            .retain(|step| !(step.is_input() && step.selector() == selector));
        Step::Input {
            selector,
            timestamp: self.clock.now_ms(),
            value: doc.value(target).to_string(),
            input_type: doc.attr(target, "type").unwrap_or("text").to_string(),
        }
    }

    fn capture_keypress(&self, doc: &Document, target: NodeId, event: &Event) -> Option<Step> {
        // Text-entry fields are already represented via the input path.
        if matches!(doc.tag_name(target), "input" | "textarea") {
            return None;
        }
        Some(Step::Keypress {
            selector: selector::synthesize(doc, target),
            timestamp: self.clock.now_ms(),
            key: event.key.clone().unwrap_or_default(),
            key_code: event.key_code.unwrap_or_default(),
        })
    }
}
