//! Error types for distpi.
//!
//! Every send, receive, and parse returns `Result<T, PiError>`. Nothing in the
//! library retries: an error is fatal wherever it is detected, and the binary
//! turns it into a nonzero exit code.

use thiserror::Error;

/// Result type alias for distpi operations.
pub type PiResult<T> = Result<T, PiError>;

/// Unified error type for the coordinator, the workers, and the substrates.
#[derive(Debug, Error)]
pub enum PiError {
    // ===== Startup =====
    /// Bad or missing configuration input.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Declarative validation of the runner configuration failed.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    // ===== Substrate =====
    /// The task substrate could not start a worker.
    #[error("Failed to start worker {worker} from '{image}': {reason}")]
    TaskStart {
        /// Index of the worker being started.
        worker: usize,
        /// Worker image identifier handed to the substrate.
        image: String,
        /// Underlying cause.
        reason: String,
    },

    /// A send or receive on a worker channel failed.
    #[error("Communication error while {context}: {reason}")]
    Communication {
        /// What the caller was doing (e.g. "receiving interval high").
        context: String,
        /// Underlying cause.
        reason: String,
    },

    // ===== Results =====
    /// A serialized partial sum is not a decimal numeral.
    #[error("Invalid partial sum '{value}': {reason}")]
    ResultParse {
        /// The offending wire text.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// A sample or intermediate value was NaN or infinite.
    #[error("Non-finite value detected at {location}")]
    NonFiniteValue {
        /// Location where the non-finite value was detected.
        location: String,
    },

    /// Arithmetic on the aggregate was undefined (e.g. zero denominator).
    #[error("Monte Carlo error: {0}")]
    MonteCarlo(String),

    // ===== I/O =====
    /// Stream I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PiError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a communication error.
    #[must_use]
    pub fn communication(context: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Communication {
            context: context.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a task start error.
    #[must_use]
    pub fn task_start(worker: usize, image: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::TaskStart {
            worker,
            image: image.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a result parse error.
    #[must_use]
    pub fn result_parse(value: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ResultParse {
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// Check if this error was raised before any work was dispatched.
    #[must_use]
    pub const fn is_startup_error(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::Validation(_))
    }
}
