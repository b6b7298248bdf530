//! Declarative request handed from service methods to the dispatcher.

use crate::auth::ServerHeaderStyle;
use crate::error::Error;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

/// One API call: method, path, ordered query, optional JSON body.
///
/// The destination type is chosen by the dispatch method (`Client::send::<T>` and friends),
/// not stored here.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
    server_headers: ServerHeaderStyle,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            server_headers: ServerHeaderStyle::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Append a query pair. Order follows the calls; the first value set for a key wins.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        if !self.query.iter().any(|(k, _)| *k == key) {
            self.query.push((key, value.to_string()));
        }
        self
    }

    /// Append a query pair only when the option is set.
    pub fn query_opt<V: ToString>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Attach a JSON body. Serialization happens here, once, not per attempt.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body)
            .map_err(|e| Error::Configuration(format!("Failed to serialize request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Send server credentials as `Server-UUID`/`Server-Secret` (see [`ServerHeaderStyle`]).
    pub fn unprefixed_server_headers(mut self) -> Self {
        self.server_headers = ServerHeaderStyle::Unprefixed;
        self
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn server_header_style(&self) -> ServerHeaderStyle {
        self.server_headers
    }
}
