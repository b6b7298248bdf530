//! Monitoring platform API client core.
//!
//! Provides the request dispatcher shared by every service method: credential
//! resolution, auth headers, retries with backoff, envelope decoding into caller
//! types, and a typed error taxonomy.

pub mod auth;
pub mod client;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod helpers;
pub mod pagination;
pub mod request;
pub mod retry;
pub mod secret;

pub use auth::{AuthConfig, AuthScheme, ServerHeaderStyle};
pub use client::{Client, RawResponse};
pub use config::Config;
pub use context::{CallContext, CancellationToken};
pub use envelope::Envelope;
pub use error::{ApiError, Error, NetworkError, NetworkErrorKind, RateLimitError, ValidationError};
pub use pagination::{ListOptions, Page, PaginationMeta};
pub use request::Request;
pub use retry::RetryPolicy;
pub use secret::Secret;

/// Library version for User-Agent and diagnostics.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
