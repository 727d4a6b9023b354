//! Wire protocol between the instrumented document and its embedding
//! controller.
//!
//! Both directions use the same envelope `{action, data, source}`. Inbound
//! messages are commands from the controller; outbound messages are engine
//! notifications. Field names follow the controller's camelCase vocabulary.

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;

fn default_input_type() -> String {
    "text".to_string()
}

/// One recorded interaction, with enough data to replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Step {
    Click {
        selector: String,
        timestamp: u64,
        /// Trimmed visible text (at most 50 chars), element value, or the
        /// literal "element".
        text: String,
        #[serde(rename = "tagName")]
        tag_name: String,
    },
    Input {
        selector: String,
        timestamp: u64,
        value: String,
        #[serde(rename = "inputType", default = "default_input_type")]
        input_type: String,
    },
    Keypress {
        selector: String,
        timestamp: u64,
        key: String,
        #[serde(rename = "keyCode")]
        key_code: u32,
    },
}

impl Step {
    pub fn selector(&self) -> &str {
        match self {
            Step::Click { selector, .. }
            | Step::Input { selector, .. }
            | Step::Keypress { selector, .. } => selector,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            Step::Click { timestamp, .. }
            | Step::Input { timestamp, .. }
            | Step::Keypress { timestamp, .. } => *timestamp,
        }
    }

    pub fn is_input(&self) -> bool {
        matches!(self, Step::Input { .. })
    }
}

/// Transport envelope used identically in both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub action: String,
    #[serde(default)]
    pub data: serde_json::Value,
    pub source: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepsPayload {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepPayload {
    pub step: Step,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepExecutingPayload {
    pub step: Step,
    pub step_number: usize,
    pub total_steps: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepCompletedPayload {
    pub step: Step,
    pub step_number: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackErrorPayload {
    pub error: String,
    pub step: Step,
}

/// Inbound commands the controller may issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    StartRecording,
    StopRecording,
    PlayRecording { steps: Vec<Step> },
    GetSteps,
}

impl Command {
    pub const START_RECORDING: &'static str = "START_RECORDING";
    pub const STOP_RECORDING: &'static str = "STOP_RECORDING";
    pub const PLAY_RECORDING: &'static str = "PLAY_RECORDING";
    pub const GET_STEPS: &'static str = "GET_STEPS";

    pub fn action(&self) -> &'static str {
        match self {
            Command::StartRecording => Self::START_RECORDING,
            Command::StopRecording => Self::STOP_RECORDING,
            Command::PlayRecording { .. } => Self::PLAY_RECORDING,
            Command::GetSteps => Self::GET_STEPS,
        }
    }

    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        match envelope.action.as_str() {
            Self::START_RECORDING => Ok(Command::StartRecording),
            Self::STOP_RECORDING => Ok(Command::StopRecording),
            Self::GET_STEPS => Ok(Command::GetSteps),
            Self::PLAY_RECORDING => {
                let payload: StepsPayload = serde_json::from_value(envelope.data.clone())
                    .map_err(|source| ProtocolError::Payload {
                        action: envelope.action.clone(),
                        source,
                    })?;
                Ok(Command::PlayRecording {
                    steps: payload.steps,
                })
            }
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }

    pub fn into_envelope(self, source: &str) -> Envelope {
        let data = match &self {
            Command::PlayRecording { steps } => serde_json::json!({ "steps": steps }),
            _ => serde_json::json!({}),
        };
        Envelope {
            action: self.action().to_string(),
            data,
            source: source.to_string(),
        }
    }
}

/// Outbound notifications the engine emits toward the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    RecorderReady,
    RecordingStarted,
    RecordingStopped { steps: Vec<Step> },
    StepRecorded { step: Step },
    StepsUpdate { steps: Vec<Step> },
    PlaybackStarted,
    StepExecuting { step: Step, step_number: usize, total_steps: usize },
    StepCompleted { step: Step, step_number: usize },
    PlaybackError { error: String, step: Step },
    PlaybackCompleted,
}

impl Notification {
    pub fn action(&self) -> &'static str {
        match self {
            Notification::RecorderReady => "RECORDER_READY",
            Notification::RecordingStarted => "RECORDING_STARTED",
            Notification::RecordingStopped { .. } => "RECORDING_STOPPED",
            Notification::StepRecorded { .. } => "STEP_RECORDED",
            Notification::StepsUpdate { .. } => "STEPS_UPDATE",
            Notification::PlaybackStarted => "PLAYBACK_STARTED",
            Notification::StepExecuting { .. } => "STEP_EXECUTING",
            Notification::StepCompleted { .. } => "STEP_COMPLETED",
            Notification::PlaybackError { .. } => "PLAYBACK_ERROR",
            Notification::PlaybackCompleted => "PLAYBACK_COMPLETED",
        }
    }

    pub fn into_envelope(self, source: &str) -> Envelope {
        let action = self.action().to_string();
        let data = match self {
            Notification::RecorderReady
            | Notification::RecordingStarted
            | Notification::PlaybackStarted
            | Notification::PlaybackCompleted => serde_json::json!({}),
            Notification::RecordingStopped { steps } | Notification::StepsUpdate { steps } => {
                serde_json::json!({ "steps": steps })
            }
            Notification::StepRecorded { step } => serde_json::json!({ "step": step }),
            Notification::StepExecuting {
                step,
                step_number,
                total_steps,
            } => serde_json::json!({
                "step": step,
                "stepNumber": step_number,
                "totalSteps": total_steps,
            }),
            Notification::StepCompleted { step, step_number } => serde_json::json!({
                "step": step,
                "stepNumber": step_number,
            }),
            Notification::PlaybackError { error, step } => serde_json::json!({
                "error": error,
                "step": step,
            }),
        };
        Envelope {
            action,
            data,
            source: source.to_string(),
        }
    }

    /// Decode an envelope back into a typed notification. Used by
    /// controller-side consumers and tests.
    pub fn from_envelope(envelope: &Envelope) -> Result<Self, ProtocolError> {
        fn payload<T: serde::de::DeserializeOwned>(
            envelope: &Envelope,
        ) -> Result<T, ProtocolError> {
            serde_json::from_value(envelope.data.clone()).map_err(|source| {
                ProtocolError::Payload {
                    action: envelope.action.clone(),
                    source,
                }
            })
        }

        match envelope.action.as_str() {
            "RECORDER_READY" => Ok(Notification::RecorderReady),
            "RECORDING_STARTED" => Ok(Notification::RecordingStarted),
            "PLAYBACK_STARTED" => Ok(Notification::PlaybackStarted),
            "PLAYBACK_COMPLETED" => Ok(Notification::PlaybackCompleted),
            "RECORDING_STOPPED" => {
                let p: StepsPayload = payload(envelope)?;
                Ok(Notification::RecordingStopped { steps: p.steps })
            }
            "STEPS_UPDATE" => {
                let p: StepsPayload = payload(envelope)?;
                Ok(Notification::StepsUpdate { steps: p.steps })
            }
            "STEP_RECORDED" => {
                let p: StepPayload = payload(envelope)?;
                Ok(Notification::StepRecorded { step: p.step })
            }
            "STEP_EXECUTING" => {
                let p: StepExecutingPayload = payload(envelope)?;
                Ok(Notification::StepExecuting {
                    step: p.step,
                    step_number: p.step_number,
                    total_steps: p.total_steps,
                })
            }
            "STEP_COMPLETED" => {
                let p: StepCompletedPayload = payload(envelope)?;
                Ok(Notification::StepCompleted {
                    step: p.step,
                    step_number: p.step_number,
                })
            }
            "PLAYBACK_ERROR" => {
                let p: PlaybackErrorPayload = payload(envelope)?;
                Ok(Notification::PlaybackError {
                    error: p.error,
                    step: p.step,
                })
            }
            other => Err(ProtocolError::UnknownAction(other.to_string())),
        }
    }
}
