//! Request dispatcher for the monitoring REST API.
//!
//! [`Client::execute`] runs one authenticated, retried exchange and returns the raw
//! response; the `send*` methods decode the envelope into the caller's type.

use crate::auth::{AuthConfig, AuthScheme};
use crate::config::Config;
use crate::context::CallContext;
use crate::envelope;
use crate::error::{classify, Error, NetworkError};
use crate::helpers::{build_url, parse_base_url};
use crate::pagination::Page;
use crate::request::Request;
use crate::retry::RetryPolicy;
use crate::secret::redact_headers;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// A successful (2xx) response before envelope decoding.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Monitoring API client.
///
/// Cheap to clone and safe to share across tasks: every call keeps its own attempt
/// counter, and the only shared resource is the HTTP connection pool. The `with_*`
/// methods return a derived client and leave `self` unchanged.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    scheme: AuthScheme,
    retry: RetryPolicy,
    timeout: Duration,
    debug: bool,
    user_agent: HeaderValue,
    http: HttpClient,
}

impl Client {
    /// Build a client with its own connection pool.
    pub fn new(config: Config) -> Result<Self, Error> {
        let http = HttpClient::builder()
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to build HTTP client: {}", e)))?;
        Self::with_transport(config, http)
    }

    /// Build a client over an existing transport (TLS, proxy or pool settings).
    /// The transport is reused for every call and never reconfigured.
    pub fn with_transport(config: Config, http: HttpClient) -> Result<Self, Error> {
        let base_url = parse_base_url(&config.base_url).map_err(Error::Configuration)?;
        let scheme = config.auth.resolve()?;
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|_| Error::Configuration("Invalid user agent".to_string()))?;
        Ok(Self {
            base_url,
            scheme,
            retry: config.retry,
            timeout: config.timeout,
            debug: config.debug,
            user_agent,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn auth_scheme(&self) -> &AuthScheme {
        &self.scheme
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub fn with_timeout(&self, timeout: Duration) -> Self {
        Self {
            timeout,
            ..self.clone()
        }
    }

    pub fn with_max_retries(&self, max_retries: u32) -> Self {
        let mut retry = self.retry.clone();
        retry.max_retries = max_retries;
        self.with_retry_policy(retry)
    }

    pub fn with_retry_policy(&self, retry: RetryPolicy) -> Self {
        Self {
            retry,
            ..self.clone()
        }
    }

    pub fn with_debug(&self, debug: bool) -> Self {
        Self {
            debug,
            ..self.clone()
        }
    }

    /// Derived client using other credentials, resolved the same way as at construction.
    pub fn with_auth(&self, auth: &AuthConfig) -> Result<Self, Error> {
        Ok(Self {
            scheme: auth.resolve()?,
            ..self.clone()
        })
    }

    /// Decode `data` as `T`. A `null` or missing payload is [`Error::EmptyPayload`].
    pub async fn send<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &Request,
    ) -> Result<T, Error> {
        let raw = self.execute(ctx, request).await?;
        envelope::decode_data(&raw)
    }

    /// Like [`Client::send`] for endpoints where an empty payload is a valid answer.
    pub async fn send_optional<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &Request,
    ) -> Result<Option<T>, Error> {
        let raw = self.execute(ctx, request).await?;
        envelope::decode_optional(&raw)
    }

    /// Decode `data` into a caller-owned value. `dest` is only written on success.
    pub async fn send_into<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &Request,
        dest: &mut T,
    ) -> Result<(), Error> {
        *dest = self.send(ctx, request).await?;
        Ok(())
    }

    /// Decode a paginated list.
    pub async fn send_page<T: DeserializeOwned>(
        &self,
        ctx: &CallContext,
        request: &Request,
    ) -> Result<Page<T>, Error> {
        let raw = self.execute(ctx, request).await?;
        envelope::decode_page(&raw)
    }

    /// For calls made only for their side effect (e.g. delete); the payload is discarded.
    pub async fn send_empty(&self, ctx: &CallContext, request: &Request) -> Result<(), Error> {
        let raw = self.execute(ctx, request).await?;
        envelope::check(&raw)
    }

    /// Run one logical call: auth, retries with backoff, classification of failures.
    pub async fn execute(
        &self,
        ctx: &CallContext,
        request: &Request,
    ) -> Result<RawResponse, Error> {
        let url = build_url(&self.base_url, &request.path, request.query_pairs());
        let body = match request.body() {
            Some(value) => Some(Bytes::from(serde_json::to_vec(value).map_err(|e| {
                Error::Configuration(format!("Failed to serialize request body: {}", e))
            })?)),
            None => None,
        };
        let headers = self.headers(request, body.is_some())?;

        let mut attempt: u32 = 0;
        loop {
            let err = match self
                .attempt(ctx, request, &url, &headers, body.clone(), attempt)
                .await
            {
                Ok(raw) => return Ok(raw),
                Err(err) => err,
            };
            if !self.retry.should_retry(attempt, &err) {
                if err.is_retryable() {
                    tracing::warn!(
                        method = %request.method,
                        path = %request.path,
                        attempts = attempt + 1,
                        error = %err,
                        "giving up after retries"
                    );
                }
                return Err(err);
            }
            let delay = self.retry.delay_after(attempt, &err);
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                attempt = attempt + 1,
                delay_ms = delay.as_millis() as u64,
                error = %err,
                "retrying request"
            );
            ctx.sleep(delay).await?;
            attempt += 1;
        }
    }

    async fn attempt(
        &self,
        ctx: &CallContext,
        request: &Request,
        url: &str,
        headers: &HeaderMap,
        body: Option<Bytes>,
        attempt: u32,
    ) -> Result<RawResponse, Error> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers.clone())
            .timeout(self.timeout);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        if self.debug {
            tracing::debug!(
                method = %request.method,
                url,
                attempt = attempt + 1,
                headers = ?redact_headers(headers),
                "sending request"
            );
        }

        let response = ctx
            .run(builder.send())
            .await?
            .map_err(|e| Error::Network(NetworkError::from(e)))?;
        let status = response.status();
        let response_headers = response.headers().clone();
        let body = ctx
            .run(response.bytes())
            .await?
            .map_err(|e| Error::Network(NetworkError::from(e)))?;

        if self.debug {
            tracing::debug!(
                method = %request.method,
                url,
                status = status.as_u16(),
                bytes = body.len(),
                "received response"
            );
        }

        if status.is_success() {
            Ok(RawResponse {
                status,
                headers: response_headers,
                body,
            })
        } else {
            Err(classify(status, &response_headers, &body))
        }
    }

    fn headers(&self, request: &Request, has_body: bool) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        self.scheme
            .apply(request.server_header_style(), &mut headers)?;
        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::new("https://api.example.com/", AuthConfig::token("tok"))
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn client_is_shareable() {
        assert_send_sync::<Client>();
    }

    #[test]
    fn new_resolves_credentials_and_base_url() {
        let client = Client::new(config()).unwrap();
        assert_eq!(client.base_url(), "https://api.example.com");
        assert_eq!(client.auth_scheme().name(), "bearer");
    }

    #[test]
    fn new_rejects_bad_setup() {
        let err = Client::new(Config::new("https://api.example.com", AuthConfig::default()))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        let err = Client::new(Config::new("api.example.com", AuthConfig::token("t"))).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn derived_clients_leave_source_untouched() {
        let client = Client::new(config()).unwrap();
        let quiet = client.with_max_retries(0).with_timeout(Duration::from_secs(2));
        assert_eq!(quiet.retry_policy().max_retries, 0);
        assert_eq!(client.retry_policy().max_retries, RetryPolicy::default().max_retries);

        let agent = client.with_auth(&AuthConfig::monitoring_key("m")).unwrap();
        assert_eq!(agent.auth_scheme().name(), "monitoring_key");
        assert_eq!(client.auth_scheme().name(), "bearer");
    }

    #[test]
    fn headers_include_defaults_and_auth() {
        let client = Client::new(config()).unwrap();
        let headers = client.headers(&Request::get("/v1/servers"), false).unwrap();
        assert_eq!(headers[ACCEPT], "application/json");
        assert!(headers.get(CONTENT_TYPE).is_none());
        assert!(headers["authorization"].is_sensitive());
        let with_body = client.headers(&Request::post("/v1/servers"), true).unwrap();
        assert_eq!(with_body[CONTENT_TYPE], "application/json");
    }
}
