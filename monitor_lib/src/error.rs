//! Error types for the monitoring API client, and the status-code classifier.

use crate::helpers::{parse_rate_limit_reset, parse_retry_after};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;

/// Base error type for monitoring API operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad client setup (credentials, base URL, header values). Detected before any I/O.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Authentication failed: {0}")]
    Authentication(ApiError),

    #[error("Forbidden: {0}")]
    Forbidden(ApiError),

    #[error("Not found: {0}")]
    NotFound(ApiError),

    #[error("Conflict: {0}")]
    Conflict(ApiError),

    #[error("Rate limited: {0}")]
    RateLimit(#[from] RateLimitError),

    #[error("Server error: {0}")]
    Server(ApiError),

    /// Any other non-success status, or an error envelope inside a 2xx response.
    #[error("API error: {0}")]
    Api(ApiError),

    /// Malformed JSON or a payload that does not fit the requested type.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// A success envelope whose `data` was missing or `null` where a value was required.
    #[error("Response (HTTP {status_code}) carried no data payload")]
    EmptyPayload { status_code: u16 },

    #[error("Deadline exceeded before the request completed")]
    DeadlineExceeded,

    #[error("Request cancelled")]
    Cancelled,
}

impl Error {
    /// HTTP status the error was classified from, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Authentication(e)
            | Self::Forbidden(e)
            | Self::NotFound(e)
            | Self::Conflict(e)
            | Self::Server(e)
            | Self::Api(e) => Some(e.status_code),
            Self::Validation(e) => Some(e.api.status_code),
            Self::RateLimit(e) => Some(e.api.status_code),
            Self::EmptyPayload { status_code } => Some(*status_code),
            _ => None,
        }
    }

    /// Whether the backoff loop would try again after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit(_) | Self::Server(_))
    }

    /// Server-provided message for API errors.
    pub fn api_message(&self) -> Option<&str> {
        match self {
            Self::Authentication(e)
            | Self::Forbidden(e)
            | Self::NotFound(e)
            | Self::Conflict(e)
            | Self::Server(e)
            | Self::Api(e) => Some(&e.message),
            Self::Validation(e) => Some(&e.api.message),
            Self::RateLimit(e) => Some(&e.api.message),
            _ => None,
        }
    }
}

/// Raised when the API returns an error response.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ApiError {
    pub status_code: u16,
    /// Machine-readable error kind from the envelope (`error` or `error.type`/`error.code`).
    pub error_type: Option<String>,
    pub message: String,
    pub response_data: Option<Value>,
}

impl ApiError {
    pub fn new(
        status_code: u16,
        error_type: Option<String>,
        message: impl Into<String>,
        response_data: Option<Value>,
    ) -> Self {
        Self {
            status_code,
            error_type,
            message: message.into(),
            response_data,
        }
    }
}

/// 400/422 with optional per-field messages.
#[derive(Error, Debug, Clone)]
#[error("{api}")]
pub struct ValidationError {
    pub api: ApiError,
    pub fields: BTreeMap<String, Vec<String>>,
}

/// 429 with whatever quota information the server sent.
#[derive(Error, Debug, Clone)]
#[error("{api}")]
pub struct RateLimitError {
    pub api: ApiError,
    pub limit: Option<u64>,
    pub remaining: Option<u64>,
    pub reset_at: Option<DateTime<Utc>>,
    pub retry_after: Option<Duration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkErrorKind {
    Connect,
    Timeout,
    Body,
    Other,
}

/// Transport-level failure: DNS, connection refused, timeout, truncated body.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct NetworkError {
    pub kind: NetworkErrorKind,
    pub message: String,
}

impl NetworkError {
    pub fn new(kind: NetworkErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for NetworkError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            NetworkErrorKind::Timeout
        } else if err.is_connect() {
            NetworkErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            NetworkErrorKind::Body
        } else {
            NetworkErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Map a non-success response (or an error envelope) into a typed error.
///
/// `body` may be anything; unparseable bodies still classify by status.
pub fn classify(status: StatusCode, headers: &HeaderMap, body: &[u8]) -> Error {
    let data: Option<Value> = serde_json::from_slice(body).ok();
    let api = ApiError::new(
        status.as_u16(),
        error_type(data.as_ref()),
        error_message(data.as_ref(), status),
        data.clone(),
    );

    match status.as_u16() {
        400 | 422 => Error::Validation(ValidationError {
            fields: field_errors(data.as_ref()),
            api,
        }),
        401 => Error::Authentication(api),
        403 => Error::Forbidden(api),
        404 => Error::NotFound(api),
        409 => Error::Conflict(api),
        429 => Error::RateLimit(RateLimitError {
            limit: header_u64(headers, "x-ratelimit-limit"),
            remaining: header_u64(headers, "x-ratelimit-remaining"),
            reset_at: header_str(headers, "x-ratelimit-reset").and_then(parse_rate_limit_reset),
            retry_after: header_str(headers, "retry-after").and_then(parse_retry_after),
            api,
        }),
        500..=599 => Error::Server(api),
        _ => Error::Api(api),
    }
}

fn error_message(data: Option<&Value>, status: StatusCode) -> String {
    let non_empty = |v: Option<&Value>| {
        v.and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };
    data.and_then(|d| {
        non_empty(d.get("message"))
            .or_else(|| non_empty(d.get("error")))
            .or_else(|| non_empty(d.get("error").and_then(|e| e.get("message"))))
    })
    .or_else(|| status.canonical_reason().map(String::from))
    .unwrap_or_else(|| "API request failed".to_string())
}

fn error_type(data: Option<&Value>) -> Option<String> {
    let err = data?.get("error")?;
    if let Some(s) = err.as_str() {
        return Some(s.to_string());
    }
    ["type", "code"].iter().find_map(|k| match err.get(*k)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn field_errors(data: Option<&Value>) -> BTreeMap<String, Vec<String>> {
    let Some(data) = data else {
        return BTreeMap::new();
    };
    let source = data
        .get("field_errors")
        .or_else(|| data.get("errors"))
        .or_else(|| data.get("error").and_then(|e| e.get("field_errors")))
        .or_else(|| data.get("error").and_then(|e| e.get("errors")))
        .and_then(Value::as_object);
    let Some(map) = source else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(field, msgs)| {
            let list = match msgs {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|m| m.as_str().map(String::from).unwrap_or_else(|| m.to_string()))
                    .collect(),
                other => vec![other.to_string()],
            };
            (field.clone(), list)
        })
        .collect()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    header_str(headers, name).and_then(|s| s.parse().ok())
}
