// Error types for status polling and service startup.

use thiserror::Error;

/// Why a status poll could not produce a verdict from the backend.
/// The poller recovers every variant locally by rendering the bot as offline.
#[derive(Debug, Error)]
pub enum PollFailure {
    #[error("status request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("status endpoint returned HTTP {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("could not decode status body: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("status body is not a JSON object")]
    NotAnObject,
}

impl PollFailure {
    /// Metric label for this failure kind.
    pub fn outcome(&self) -> &'static str {
        match self {
            PollFailure::Request(_) => "request_error",
            PollFailure::HttpStatus(_) => "http_error",
            PollFailure::Decode(_) | PollFailure::NotAnObject => "body_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            PollFailure::Request(e) | PollFailure::Decode(e) => e.is_timeout(),
            PollFailure::HttpStatus(_) | PollFailure::NotAnObject => false,
        }
    }
}

/// Errors that stop the service from starting or serving.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
