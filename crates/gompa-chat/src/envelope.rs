//! Response envelope and error classification.

use chrono::{SecondsFormat, Utc};
use gompa_core::Error;
use serde::Serialize;

pub const FALLBACK_MESSAGE: &str = "Sorry, I could not generate a response.";

/// User-visible failure class. Owns the HTTP status and the public text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    RateLimited,
    Timeout,
    Internal,
}

impl ErrorKind {
    /// Classify a failure.
    ///
    /// Local validation and missing provider credentials are matched
    /// structurally. Everything else is matched on its message text:
    /// `401`, then `429`, then `timeout`, else internal.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::InvalidInput => ErrorKind::InvalidInput,
            Error::ProviderUnconfigured(_) => ErrorKind::Unauthorized,
            other => Self::classify_message(&other.to_string()),
        }
    }

    pub fn classify_message(message: &str) -> Self {
        if message.contains("401") {
            ErrorKind::Unauthorized
        } else if message.contains("429") {
            ErrorKind::RateLimited
        } else if message.contains("timeout") {
            ErrorKind::Timeout
        } else {
            ErrorKind::Internal
        }
    }

    pub fn status_code(self) -> u16 {
        match self {
            ErrorKind::InvalidInput => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::RateLimited => 429,
            ErrorKind::Timeout => 504,
            ErrorKind::Internal => 500,
        }
    }

    pub fn public_message(self) -> &'static str {
        match self {
            ErrorKind::InvalidInput => "Message is required",
            ErrorKind::Unauthorized => {
                "Invalid or missing API key. Please check the server configuration."
            }
            ErrorKind::RateLimited => "Rate limit exceeded. Please try again later.",
            ErrorKind::Timeout => "Request timeout. Please try again.",
            ErrorKind::Internal => "An error occurred while processing your request",
        }
    }
}

/// Normalized chat outcome, serialized as the HTTP response body.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ResponseEnvelope {
    Success {
        success: bool,
        message: String,
        timestamp: String,
    },
    Failure {
        #[serde(skip)]
        kind: ErrorKind,
        success: bool,
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<String>,
    },
}

impl ResponseEnvelope {
    pub fn success(message: impl Into<String>) -> Self {
        ResponseEnvelope::Success {
            success: true,
            message: message.into(),
            timestamp: now_iso8601(),
        }
    }

    /// Build a failure envelope. Raw error text is attached only when
    /// `expose_details` is set.
    pub fn failure(err: &Error, expose_details: bool) -> Self {
        let kind = ErrorKind::classify(err);
        ResponseEnvelope::Failure {
            kind,
            success: false,
            error: kind.public_message().to_string(),
            details: expose_details.then(|| err.to_string()),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ResponseEnvelope::Success { .. })
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ResponseEnvelope::Success { .. } => 200,
            ResponseEnvelope::Failure { kind, .. } => kind.status_code(),
        }
    }
}

/// Current UTC time as ISO-8601 with millisecond precision, e.g.
/// `2024-05-01T08:30:00.123Z`.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
