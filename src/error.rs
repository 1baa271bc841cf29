//! Error handling for Claro
//!
//! The public `Player` surface never returns these to a caller; failure is
//! expressed through session state and defensive no-ops. These errors exist
//! for the internal seams (media element, stream capture, graph build) and
//! for hosts that pre-validate annotation data.

use thiserror::Error;

/// Result type alias for Claro operations
pub type Result<T> = std::result::Result<T, ClaroError>;

/// Main error type for Claro operations
#[derive(Error, Debug)]
pub enum ClaroError {
    // Primary-path errors (user-visible, terminal for the session)
    #[error("Failed to load recording '{uri}': {reason}")]
    Load {
        uri: String,
        reason: String,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    // Enhancement-path errors (contained, degrade without interrupting playback)
    #[error("Processing graph unavailable: {reason}")]
    GraphUnavailable { reason: String },

    #[error("Decoded stream already captured by another graph")]
    StreamAlreadyCaptured,

    #[error("No decoded stream available: {reason}")]
    StreamUnavailable { reason: String },

    // Annotation errors (recovered silently, never surfaced through playback)
    #[error("Invalid timestamp: {raw:?}")]
    InvalidTimestamp { raw: String },

    // Parameter validation
    #[error("Invalid parameter {param}: {value} (expected {expected})")]
    InvalidParameter {
        param: String,
        value: String,
        expected: String,
    },

    // I/O Errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClaroError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            ClaroError::Load { .. } => "LOAD_ERROR",
            ClaroError::UnsupportedFormat { .. } => "UNSUPPORTED_FORMAT",
            ClaroError::GraphUnavailable { .. } => "GRAPH_UNAVAILABLE",
            ClaroError::StreamAlreadyCaptured => "STREAM_ALREADY_CAPTURED",
            ClaroError::StreamUnavailable { .. } => "STREAM_UNAVAILABLE",
            ClaroError::InvalidTimestamp { .. } => "INVALID_TIMESTAMP",
            ClaroError::InvalidParameter { .. } => "INVALID_PARAMETER",
            ClaroError::Io(_) => "IO_ERROR",
            ClaroError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Errors confined to the optional enhancement path: playback continues,
    /// only the graph-backed features degrade.
    pub fn is_contained(&self) -> bool {
        matches!(
            self,
            ClaroError::GraphUnavailable { .. }
                | ClaroError::StreamAlreadyCaptured
                | ClaroError::StreamUnavailable { .. }
                | ClaroError::InvalidTimestamp { .. }
        )
    }

    /// Check if this error is recoverable by the user
    pub fn is_recoverable(&self) -> bool {
        match self {
            ClaroError::Load { .. } => true,
            ClaroError::UnsupportedFormat { .. } => true,
            ClaroError::InvalidTimestamp { .. } => true,
            ClaroError::InvalidParameter { .. } => true,
            _ => false,
        }
    }

    /// Get a user-friendly message for this error
    pub fn friendly_message(&self) -> String {
        match self {
            ClaroError::Load { uri, reason, .. } => {
                format!(
                    "The recording at '{}' could not be loaded ({}). Select it again to retry.",
                    uri, reason
                )
            }
            ClaroError::GraphUnavailable { reason } => {
                format!(
                    "Noise reduction is not available for this recording ({}). \
                     Playback continues without enhancement.",
                    reason
                )
            }
            ClaroError::StreamAlreadyCaptured => {
                "Noise reduction is not available: the audio stream is already in use. \
                 Playback continues without enhancement."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = ClaroError::Load {
            uri: "recording.wav".to_string(),
            reason: "file not found".to_string(),
            source: None,
        };
        assert_eq!(err.error_code(), "LOAD_ERROR");
        assert_eq!(
            ClaroError::StreamAlreadyCaptured.error_code(),
            "STREAM_ALREADY_CAPTURED"
        );
    }

    #[test]
    fn test_containment_split() {
        // Primary-path failures are user-visible, not contained
        let load = ClaroError::Load {
            uri: "x.wav".to_string(),
            reason: "decode failure".to_string(),
            source: None,
        };
        assert!(!load.is_contained());

        // Enhancement-path failures are contained
        let graph = ClaroError::GraphUnavailable {
            reason: "stream already captured".to_string(),
        };
        assert!(graph.is_contained());
        assert!(ClaroError::StreamAlreadyCaptured.is_contained());
    }

    #[test]
    fn test_friendly_message_mentions_degradation() {
        let err = ClaroError::GraphUnavailable {
            reason: "platform API unavailable".to_string(),
        };
        assert!(err.friendly_message().contains("without enhancement"));
    }
}
