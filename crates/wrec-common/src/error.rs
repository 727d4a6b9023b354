use thiserror::Error;

/// Errors raised while decoding inbound envelopes.
///
/// The engine never replies to a malformed message; these errors exist so the
/// dispatch layer can log and drop with a reason.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Invalid payload for {action}: {source}")]
    Payload {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Errors surfaced by a message channel implementation.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel closed")]
    Closed,

    #[error("Send failed: {0}")]
    Send(String),
}
