//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or a
    /// body that doesn't match the declared `type`.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The envelope parsed but names a message type the server doesn't
    /// accept.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
