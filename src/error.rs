//! Error types and the per-resource error normalizer.
//!
//! Every remote failure is turned into a [`DomainError`] before it reaches a
//! store. The wording depends on which resource failed; see
//! [`Resource::status_message`].

use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The single error shape surfaced by every resource client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DomainError {
    /// Human-readable message, safe to show to the user.
    pub message: String,
    /// HTTP status, absent for network failures.
    pub status: Option<u16>,
}

impl DomainError {
    pub fn new(message: impl Into<String>, status: Option<u16>) -> Self {
        Self {
            message: message.into(),
            status,
        }
    }

    /// True when the server answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// True when the server answered 409.
    pub fn is_conflict(&self) -> bool {
        self.status == Some(409)
    }
}

/// Result alias for resource client calls.
pub type Result<T> = std::result::Result<T, DomainError>;

/// Failures while constructing an API client.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Base URL did not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Client-side precondition failures, detected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("{0} must be a number")]
    NotANumber(&'static str),

    #[error("{0} must be greater than or equal to 0")]
    Negative(&'static str),

    #[error("Please select both start and end dates")]
    MissingRange,

    #[error("Start date must be before end date")]
    InvertedRange,
}

/// A raw failure from the transport, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportFailure {
    /// No response was received.
    Network { message: String },
    /// The server answered, but not with a usable success body.
    Status {
        status: u16,
        message: String,
        /// Response body, when it parsed as JSON.
        body: Option<Value>,
    },
}

impl TransportFailure {
    /// Failure for a request that never produced a response.
    pub fn network(err: &reqwest::Error) -> Self {
        match err.status() {
            Some(status) => Self::Status {
                status: status.as_u16(),
                message: err.to_string(),
                body: None,
            },
            None => Self::Network {
                message: err.to_string(),
            },
        }
    }

    /// Failure for a non-success response.
    pub fn http(url: &str, status: reqwest::StatusCode, body: &[u8]) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: format!(
                "Http failure response for {url}: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown Status")
            ),
            body: serde_json::from_slice(body).ok(),
        }
    }

    /// Failure for a success response whose body did not decode.
    pub fn decode(url: &str, status: reqwest::StatusCode, err: &serde_json::Error) -> Self {
        Self::Status {
            status: status.as_u16(),
            message: format!("Http failure during parsing for {url}: {err}"),
            body: None,
        }
    }

    /// HTTP status, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { .. } => None,
            Self::Status { status, .. } => Some(*status),
        }
    }
}

/// The remote resource a call belongs to; selects the message table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Balances,
    Metrics,
    Chat,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Balances => "balances",
            Self::Metrics => "metrics",
            Self::Chat => "chat",
        };
        f.write_str(name)
    }
}

impl Resource {
    /// Fixed wording for a status, if this resource maps it.
    pub fn status_message(self, status: u16) -> Option<&'static str> {
        match (self, status) {
            (Self::Balances, 400) => Some("Invalid balance data provided"),
            (Self::Balances, 404) => Some("Balance not found"),
            (Self::Balances, 409) => Some("A balance for this month already exists"),
            (Self::Metrics, 400) => Some("Invalid request parameters"),
            (Self::Metrics, 404) => Some("Metrics data not found"),
            (Self::Balances | Self::Metrics, 500) => Some("Server error occurred"),
            _ => None,
        }
    }

    /// Convert a transport failure into a [`DomainError`].
    ///
    /// Never fails. The original failure is logged.
    pub fn normalize(self, failure: &TransportFailure) -> DomainError {
        let error = match failure {
            TransportFailure::Network { message } => {
                DomainError::new(format!("Network error: {message}"), None)
            }
            TransportFailure::Status {
                status,
                message,
                body,
            } => {
                let mapped = match self {
                    Self::Chat => body.as_ref().and_then(server_message),
                    Self::Balances | Self::Metrics => {
                        self.status_message(*status).map(str::to_string)
                    }
                };
                let text =
                    mapped.unwrap_or_else(|| format!("Server returned code {status}: {message}"));
                DomainError::new(text, Some(*status))
            }
        };

        tracing::warn!(
            name: "api.request.failed",
            resource = %self,
            status = ?failure.status(),
            failure = ?failure,
            "{} service error",
            self
        );

        error
    }
}

/// Pull a server-supplied message out of an error body.
fn server_message(body: &Value) -> Option<String> {
    let candidates = [
        body.get("message"),
        body.get("error").and_then(|e| e.get("message")),
        body.get("detail"),
    ];
    candidates
        .into_iter()
        .flatten()
        .find_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}
