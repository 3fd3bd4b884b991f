//! Error types for the chord analysis core.
//!
//! Most "failures" in the pipeline are normal outcomes (no pitch, silence)
//! and are expressed as `Option` or empty collections. The variants here are
//! reserved for caller contract violations.

use thiserror::Error;

/// Result type for chord-core operations.
pub type Result<T> = std::result::Result<T, ChordError>;

/// Errors raised by the analysis core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChordError {
    /// A note name did not match `[A-G](#)?` followed by an integer octave.
    #[error("malformed note name: '{name}'")]
    MalformedNoteName {
        /// The rejected input.
        name: String,
    },

    /// A configuration value is out of its valid range.
    #[error("invalid configuration '{name}': {message}")]
    InvalidConfig {
        /// Field name.
        name: String,
        /// What is wrong with it.
        message: String,
    },

    /// Input parameters that cannot describe a real buffer.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ChordError {
    pub(crate) fn malformed(name: &str) -> Self {
        ChordError::MalformedNoteName {
            name: name.to_string(),
        }
    }

    pub(crate) fn config(name: &str, message: impl Into<String>) -> Self {
        ChordError::InvalidConfig {
            name: name.to_string(),
            message: message.into(),
        }
    }
}
