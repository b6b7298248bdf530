//! Response envelope decoding.
//!
//! Every response is wrapped in one of three shapes, told apart by which fields are
//! present rather than by a discriminator:
//!
//! - standard: `{"status", "message", "data"}`
//! - paginated: `{"status", "message", "data": [...], "meta": {...}}`
//! - error: `{"status": "error", "message", "error"}`
//!
//! The payload type is supplied by the caller as a type parameter.

use crate::client::RawResponse;
use crate::error::{classify, Error};
use crate::pagination::{Page, PaginationMeta};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Standard {
        status: Option<String>,
        message: Option<String>,
        data: Option<Value>,
    },
    Paginated {
        status: Option<String>,
        message: Option<String>,
        data: Option<Value>,
        meta: PaginationMeta,
    },
    Error {
        status: Option<String>,
        message: Option<String>,
        error: Value,
    },
}

#[derive(Deserialize)]
struct Wire {
    status: Option<String>,
    message: Option<String>,
    data: Option<Value>,
    meta: Option<PaginationMeta>,
    error: Option<Value>,
}

impl Envelope {
    /// Parse a body into its envelope shape. An empty body reads as a standard envelope
    /// without data (204-style responses).
    pub fn parse(body: &[u8]) -> Result<Self, Error> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::Standard {
                status: None,
                message: None,
                data: None,
            });
        }
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| Error::Decode(format!("invalid JSON: {}", e)))?;
        if !value.is_object() {
            return Err(Error::Decode(
                "expected a JSON object envelope".to_string(),
            ));
        }
        let wire: Wire = serde_json::from_value(value)
            .map_err(|e| Error::Decode(format!("malformed envelope: {}", e)))?;

        let is_error = wire.status.as_deref() == Some("error")
            || wire.error.as_ref().is_some_and(|e| !e.is_null());
        Ok(if is_error {
            Self::Error {
                status: wire.status,
                message: wire.message,
                error: wire.error.unwrap_or(Value::Null),
            }
        } else if let Some(meta) = wire.meta {
            Self::Paginated {
                status: wire.status,
                message: wire.message,
                data: wire.data,
                meta: meta.normalized(),
            }
        } else {
            Self::Standard {
                status: wire.status,
                message: wire.message,
                data: wire.data,
            }
        })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Standard { message, .. }
            | Self::Paginated { message, .. }
            | Self::Error { message, .. } => message.as_deref(),
        }
    }
}

/// Parse the envelope of a response the dispatcher already accepted (2xx).
/// An error envelope is still an error.
fn accepted(raw: &RawResponse) -> Result<Envelope, Error> {
    let envelope = Envelope::parse(&raw.body)?;
    if let Envelope::Error { .. } = envelope {
        return Err(classify(raw.status, &raw.headers, &raw.body));
    }
    Ok(envelope)
}

fn deserialize<T: DeserializeOwned>(data: Value) -> Result<T, Error> {
    serde_json::from_value(data).map_err(|e| Error::Decode(format!("unexpected payload: {}", e)))
}

/// Validate the response and discard the payload.
///
/// The status was already accepted, so only a well-formed error envelope fails here.
/// Bodies that are not an envelope at all (`OK`, `Deleted`, an HTML page) are ignored.
pub fn check(raw: &RawResponse) -> Result<(), Error> {
    match Envelope::parse(&raw.body) {
        Ok(Envelope::Error { .. }) => Err(classify(raw.status, &raw.headers, &raw.body)),
        _ => Ok(()),
    }
}

/// `data` decoded as `T`; a missing or `null` payload is [`Error::EmptyPayload`].
pub fn decode_data<T: DeserializeOwned>(raw: &RawResponse) -> Result<T, Error> {
    decode_optional(raw)?.ok_or(Error::EmptyPayload {
        status_code: raw.status.as_u16(),
    })
}

/// `data` decoded as `T`, with a missing or `null` payload as `None`.
pub fn decode_optional<T: DeserializeOwned>(raw: &RawResponse) -> Result<Option<T>, Error> {
    let data = match accepted(raw)? {
        Envelope::Standard { data, .. } | Envelope::Paginated { data, .. } => data,
        Envelope::Error { .. } => None,
    };
    match data {
        None | Some(Value::Null) => Ok(None),
        Some(v) => deserialize(v).map(Some),
    }
}

/// `data` decoded as a list of `T` plus pagination metadata.
///
/// `data: null` is accepted as an empty page when the meta reports no items.
pub fn decode_page<T: DeserializeOwned>(raw: &RawResponse) -> Result<Page<T>, Error> {
    let empty = || Error::EmptyPayload {
        status_code: raw.status.as_u16(),
    };
    match accepted(raw)? {
        Envelope::Paginated { data, meta, .. } => {
            let items = match data {
                Some(Value::Null) | None if meta.total_items == 0 => Vec::new(),
                Some(Value::Null) | None => return Err(empty()),
                Some(v) => deserialize(v)?,
            };
            Ok(Page { items, meta })
        }
        Envelope::Standard { data, .. } => {
            let items: Vec<T> = match data {
                Some(Value::Null) | None => return Err(empty()),
                Some(v) => deserialize(v)?,
            };
            let total = items.len() as u64;
            let meta = PaginationMeta::calculate(1, total.max(1), total);
            Ok(Page { items, meta })
        }
        Envelope::Error { .. } => Err(empty()),
    }
}
