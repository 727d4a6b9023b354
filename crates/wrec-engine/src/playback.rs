//! Sequential, timed, fail-fast step execution.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};
use wrec_common::protocol::{Notification, Step};

use crate::channel::Emitter;
use crate::clock::Clock;
use crate::config::TimingConfig;
use crate::dom::{Document, Event, NodeId};

/// Temporary highlight applied to the element a step acts on.
const HIGHLIGHT_STYLE: &str = "outline: 2px solid #1e88e5; outline-offset: 2px;";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Idle,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Element not found: {selector}")]
    ElementNotFound { selector: String },
}

/// Dispatches the type-specific interaction for one resolved step. The
/// playback state machine never constructs events itself, so tests can
/// substitute a fake driver.
#[async_trait]
pub trait InteractionDriver: Send + Sync {
    async fn perform(
        &self,
        doc: &mut Document,
        target: NodeId,
        step: &Step,
    ) -> Result<(), PlaybackError>;
}

/// Default driver: synthetic (untrusted) DOM events.
pub struct SyntheticDriver {
    clock: Arc<dyn Clock>,
    timing: TimingConfig,
}

impl SyntheticDriver {
    pub fn new(clock: Arc<dyn Clock>, timing: TimingConfig) -> Self {
        Self { clock, timing }
    }
}

#[async_trait]
impl InteractionDriver for SyntheticDriver {
    async fn perform(
        &self,
        doc: &mut Document,
        target: NodeId,
        step: &Step,
    ) -> Result<(), PlaybackError> {
        match step {
            Step::Click { .. } => {
                doc.dispatch(target, Event::synthetic("click"));
            }
            Step::Input { value, .. } => {
                doc.focus(target);
                doc.set_value(target, "");
                let mut typed = String::new();
                for ch in value.chars() {
                    typed.push(ch);
                    doc.set_value(target, &typed);
                    doc.dispatch(target, Event::synthetic("input").cancelable(false));
                    self.clock.sleep(self.timing.keystroke()).await;
                }
                doc.dispatch(target, Event::synthetic("change").cancelable(false));
            }
            Step::Keypress { key, key_code, .. } => {
                doc.dispatch(target, Event::synthetic("keydown").with_key(key, *key_code));
            }
        }
        Ok(())
    }
}

pub struct Player {
    state: PlaybackState,
    timing: TimingConfig,
    clock: Arc<dyn Clock>,
    driver: Arc<dyn InteractionDriver>,
}

impl Player {
    pub fn new(timing: TimingConfig, clock: Arc<dyn Clock>) -> Self {
        let driver = Arc::new(SyntheticDriver::new(clock.clone(), timing.clone()));
        Self {
            state: PlaybackState::Idle,
            timing,
            clock,
            driver,
        }
    }

    pub fn set_driver(&mut self, driver: Arc<dyn InteractionDriver>) {
        self.driver = driver;
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Replay `steps` in order against `doc`. Fail-fast: the first step
    /// failure is reported and aborts the run. Failures never propagate past
    /// this method.
    pub async fn play(&mut self, doc: &mut Document, steps: &[Step], emitter: &mut Emitter<'_>) {
        if self.state == PlaybackState::Running {
            // Concurrent playback is a caller error; refuse to interleave.
            warn!("playback already running, ignoring request");
            return;
        }
        self.state = PlaybackState::Running;
        info!(total = steps.len(), "playback started");
        emitter.emit(Notification::PlaybackStarted);

        let total = steps.len();
        for (index, step) in steps.iter().enumerate() {
            let step_number = index + 1;
            emitter.emit(Notification::StepExecuting {
                step: step.clone(),
                step_number,
                total_steps: total,
            });

            if let Err(err) = self.run_step(doc, step).await {
                self.state = PlaybackState::Failed;
                warn!(step_number, %err, "playback failed");
                emitter.emit(Notification::PlaybackError {
                    error: err.to_string(),
                    step: step.clone(),
                });
                return;
            }

            debug!(step_number, "step completed");
            emitter.emit(Notification::StepCompleted {
                step: step.clone(),
                step_number,
            });

            if step_number < total {
                self.clock.sleep(self.timing.between_steps()).await;
            }
        }

        self.state = PlaybackState::Completed;
        info!("playback completed");
        emitter.emit(Notification::PlaybackCompleted);
    }

    async fn run_step(&self, doc: &mut Document, step: &Step) -> Result<(), PlaybackError> {
        let target =
            doc.query_selector(step.selector())
                .ok_or_else(|| PlaybackError::ElementNotFound {
                    selector: step.selector().to_string(),
                })?;

        doc.scroll_into_view(target);
        self.clock.sleep(self.timing.settle()).await;

        // The full inline style text is saved and restored, not just the
        // highlight properties, so no styling leaks into the host page.
        let original_style = doc.inline_style(target).to_string();
        doc.set_inline_style(target, HIGHLIGHT_STYLE);

        let result = self.driver.perform(doc, target, step).await;

        self.clock.sleep(self.timing.post_action()).await;
        doc.set_inline_style(target, &original_style);
        result
    }
}
