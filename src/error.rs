//! Error types for RoadHog flows.
//!
//! All errors are represented by the `RoadhogError` enum. Validation failures
//! are returned as values carrying every violation, so callers can branch on
//! them without unwinding.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::Violation;

/// Unified error type for all RoadHog operations.
#[derive(Deserialize, Serialize, Error, Debug, Clone, PartialEq)]
pub enum RoadhogError {
    /// Caller supplied data that violates the flow's input schema.
    #[error("invalid input for flow '{flow}': {}", join_violations(.violations))]
    InputValidation {
        flow: String,
        violations: Vec<Violation>,
    },

    /// The backend answered with a value that does not match the output schema.
    #[error("output of flow '{flow}' violates its contract: {}", join_violations(.violations))]
    OutputContract {
        flow: String,
        violations: Vec<Violation>,
    },

    /// Network or service failure talking to the generative backend.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// The backend refused the prompt (content policy, bad request).
    #[error("backend rejected the request: {0}")]
    BackendRejected(String),

    /// The backend answered with data that cannot be parsed at all.
    #[error("backend returned a malformed response: {0}")]
    BackendMalformedResponse(String),

    /// Schema or template misconfiguration found while registering flows.
    #[error("{0}")]
    Programmer(String),

    /// No flow is registered under the requested name.
    #[error("flow '{0}' is not registered")]
    FlowNotFound(String),

    /// Configuration parsing or validation errors.
    #[error("{0}")]
    Config(String),

    /// Data conversion errors (JSON, typed flow payloads).
    #[error("{0}")]
    Convert(String),

    /// Template parsing errors.
    #[error("{0}")]
    Template(String),

    /// Route resolution errors.
    #[error("{0}")]
    Route(String),

    /// I/O operation errors.
    #[error("{0}")]
    IoError(String),
}

impl RoadhogError {
    /// Field violations carried by validation errors, empty for every other kind.
    pub fn violations(&self) -> &[Violation] {
        match self {
            RoadhogError::InputValidation {
                violations, ..
            }
            | RoadhogError::OutputContract {
                violations, ..
            } => violations,
            _ => &[],
        }
    }

    /// Whether a caller-driven retry may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RoadhogError::BackendUnavailable(_))
    }
}

fn join_violations(violations: &[Violation]) -> String {
    violations.iter().map(|v| v.to_string()).collect::<Vec<_>>().join("; ")
}

impl From<RoadhogError> for String {
    fn from(val: RoadhogError) -> Self {
        val.to_string()
    }
}

impl From<std::io::Error> for RoadhogError {
    fn from(error: std::io::Error) -> Self {
        RoadhogError::IoError(error.to_string())
    }
}

impl From<serde_json::Error> for RoadhogError {
    fn from(error: serde_json::Error) -> Self {
        RoadhogError::Convert(error.to_string())
    }
}

impl From<toml::de::Error> for RoadhogError {
    fn from(error: toml::de::Error) -> Self {
        RoadhogError::Config(error.to_string())
    }
}

impl From<jsonschema::ValidationError<'_>> for RoadhogError {
    fn from(error: jsonschema::ValidationError<'_>) -> Self {
        RoadhogError::Programmer(error.to_string())
    }
}

impl From<reqwest::Error> for RoadhogError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            RoadhogError::BackendMalformedResponse(error.to_string())
        } else {
            RoadhogError::BackendUnavailable(error.to_string())
        }
    }
}
