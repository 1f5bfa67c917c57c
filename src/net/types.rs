//! Request/response types and the error taxonomy shared by the dispatcher
//! and the auth operations.

use serde_json::Value;

// =============================================================================
// ERROR
// =============================================================================

/// Failures surfaced by dispatched calls and auth operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Transport failure: DNS, connect, TLS, timeout, or a truncated body.
    #[error("network error: {0}")]
    Network(String),

    /// The server rejected the credential (HTTP 401).
    #[error("session expired, please log in again")]
    AuthenticationExpired,

    /// The server has no such endpoint (HTTP 404).
    #[error("endpoint not found: {path}")]
    EndpointNotFound { path: String },

    /// Any other non-2xx status.
    #[error("{message}")]
    RequestFailed { status: u16, message: String },

    /// A 2xx body did not have the expected shape.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Input rejected locally before any network call.
    #[error("{0}")]
    Validation(String),
}

pub const GENERIC_FAILURE_MESSAGE: &str = "Request failed";

impl ApiError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::AuthenticationExpired => "E_AUTH_EXPIRED",
            Self::EndpointNotFound { .. } => "E_NOT_FOUND",
            Self::RequestFailed { .. } => "E_REQUEST_FAILED",
            Self::MalformedResponse(_) => "E_MALFORMED_RESPONSE",
            Self::Validation(_) => "E_VALIDATION",
        }
    }

    /// Whether repeating the same call might succeed. The dispatcher never
    /// retries; this is advice for callers.
    #[must_use]
    pub fn retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RequestFailed { status: 429 | 500..=599, .. })
    }

    /// Message suitable for showing to the person at the keyboard.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Network(_) => NETWORK_MESSAGE.to_owned(),
            Self::AuthenticationExpired => "Your session has expired. Please log in again.".to_owned(),
            Self::EndpointNotFound { .. } => "This service is unavailable right now. Please try again later.".to_owned(),
            Self::RequestFailed { status, message } => request_failed_message(*status, message),
            Self::MalformedResponse(_) => "Unexpected response from the server. Please try again.".to_owned(),
        }
    }
}

const NETWORK_MESSAGE: &str = "Network error. Please check your internet connection and try again.";

fn request_failed_message(status: u16, message: &str) -> String {
    let lower = message.to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    let friendly = if has(&["already registered", "already exists", "duplicate"]) {
        "This phone number is already registered. Please log in instead or use a different number."
    } else if has(&["network", "fetch"]) {
        NETWORK_MESSAGE
    } else if has(&["cors"]) {
        "Connection error. Please try again or contact support if the problem persists."
    } else if has(&["phone", "invalid number"]) {
        "Please enter a valid phone number."
    } else if has(&["password"]) {
        "Password does not meet requirements. Please use at least 8 characters."
    } else if status == 429 || has(&["rate limit", "too many"]) {
        "Too many attempts. Please wait a few minutes and try again."
    } else if status >= 500 || has(&["server error"]) {
        "Server error. Please try again in a few moments."
    } else if has(&["referral"]) {
        "Invalid referral code. You can continue without one or check the code and try again."
    } else if message.is_empty() {
        "Request failed. Please try again or contact support."
    } else {
        return message.to_owned();
    };
    friendly.to_owned()
}

// =============================================================================
// REQUEST
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// Only these methods serialize a request body.
    #[must_use]
    pub fn carries_body(self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical call, alive only for the duration of a dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub method: HttpMethod,
    pub path: String,
    pub body: Option<Value>,
    pub requires_auth: bool,
}

impl PendingRequest {
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self { method: HttpMethod::Get, path: path.into(), body: None, requires_auth: false }
    }

    #[must_use]
    pub fn post(path: impl Into<String>, body: Option<Value>) -> Self {
        Self { method: HttpMethod::Post, path: path.into(), body, requires_auth: false }
    }

    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }
}

/// Fully resolved request handed to a [`super::transport::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl OutboundRequest {
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw status + body returned by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
