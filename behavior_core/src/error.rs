//! Error types for the serialization boundary.

use thiserror::Error;

/// Errors converting engine structures to or from their serialized
/// key-value form. The label names the structure being converted.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to encode {0}: {1}")]
    Encode(&'static str, #[source] serde_json::Error),

    #[error("failed to decode {0}: {1}")]
    Decode(&'static str, #[source] serde_json::Error),
}
