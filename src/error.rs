//! Error handling for the rsurf library
//!
//! This module provides the crate-wide error type and result alias used by
//! the builder, the serialization layer, and the succinct primitives.

use thiserror::Error;

/// Main error type for the rsurf library
#[derive(Error, Debug)]
pub enum SurfError {
    /// I/O related errors (end of buffer, short writes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Builder input violates the key contract
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Error message describing the violation
        message: String,
    },

    /// Serialized stream is inconsistent with its headers
    #[error("Corrupt stream: {message}")]
    CorruptStream {
        /// Error message describing the inconsistency
        message: String,
    },

    /// Index out of bounds access
    #[error("Out of bounds: index {index}, size {size}")]
    OutOfBounds {
        /// The invalid index
        index: usize,
        /// The valid size/length
        size: usize,
    },

    /// Configuration or parameter errors
    #[error("Invalid configuration: {message}")]
    Configuration {
        /// Configuration error message
        message: String,
    },
}

impl SurfError {
    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a corrupt stream error
    pub fn corrupt_stream<S: Into<String>>(message: S) -> Self {
        Self::CorruptStream {
            message: message.into(),
        }
    }

    /// Create an out of bounds error
    pub fn out_of_bounds(index: usize, size: usize) -> Self {
        Self::OutOfBounds { index, size }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error from a message
    pub fn io_error<S: Into<String>>(message: S) -> Self {
        Self::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            message.into(),
        ))
    }

    /// Get the error category for logging/metrics
    pub fn category(&self) -> &'static str {
        match self {
            Self::Io(_) => "io",
            Self::InvalidInput { .. } => "input",
            Self::CorruptStream { .. } => "stream",
            Self::OutOfBounds { .. } => "bounds",
            Self::Configuration { .. } => "config",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SurfError>;

/// Assert that an index is within bounds
#[inline]
pub fn check_bounds(index: usize, size: usize) -> Result<()> {
    if index >= size {
        Err(SurfError::out_of_bounds(index, size))
    } else {
        Ok(())
    }
}
