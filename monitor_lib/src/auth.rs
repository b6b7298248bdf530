//! Credential resolution and the per-scheme auth header strategy.

use crate::error::Error;
use crate::secret::{non_blank, Secret};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};

/// Configuration bag holding up to five credential shapes.
///
/// Only one should be populated. When several are, [`AuthConfig::resolve`] picks the
/// first complete one in this order: token, API key pair, server pair, monitoring key,
/// registration key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthConfig {
    pub token: Option<Secret>,
    pub api_key: Option<Secret>,
    pub api_secret: Option<Secret>,
    pub server_uuid: Option<Secret>,
    pub server_secret: Option<Secret>,
    pub monitoring_key: Option<Secret>,
    pub registration_key: Option<Secret>,
}

impl AuthConfig {
    pub fn token(token: impl Into<Secret>) -> Self {
        Self {
            token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn api_key(key: impl Into<Secret>, secret: impl Into<Secret>) -> Self {
        Self {
            api_key: Some(key.into()),
            api_secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn server(uuid: impl Into<Secret>, secret: impl Into<Secret>) -> Self {
        Self {
            server_uuid: Some(uuid.into()),
            server_secret: Some(secret.into()),
            ..Self::default()
        }
    }

    pub fn monitoring_key(key: impl Into<Secret>) -> Self {
        Self {
            monitoring_key: Some(key.into()),
            ..Self::default()
        }
    }

    pub fn registration_key(key: impl Into<Secret>) -> Self {
        Self {
            registration_key: Some(key.into()),
            ..Self::default()
        }
    }

    /// Pick the active scheme. Pure; called once when the client is built.
    pub fn resolve(&self) -> Result<AuthScheme, Error> {
        let pair = |a: &Option<Secret>, b: &Option<Secret>| {
            non_blank(a.as_ref())
                .zip(non_blank(b.as_ref()))
                .map(|(a, b)| (a.clone(), b.clone()))
        };

        let candidates = [
            non_blank(self.token.as_ref()).map(|t| AuthScheme::Bearer(t.clone())),
            pair(&self.api_key, &self.api_secret)
                .map(|(key, secret)| AuthScheme::ApiKey { key, secret }),
            pair(&self.server_uuid, &self.server_secret)
                .map(|(uuid, secret)| AuthScheme::Server { uuid, secret }),
            non_blank(self.monitoring_key.as_ref()).map(|k| AuthScheme::MonitoringKey(k.clone())),
            non_blank(self.registration_key.as_ref())
                .map(|k| AuthScheme::RegistrationKey(k.clone())),
        ];

        let mut found = candidates.into_iter().flatten();
        let Some(active) = found.next() else {
            return Err(Error::Configuration(self.missing_reason()));
        };
        let ignored: Vec<&'static str> = found.map(|s| s.name()).collect();
        if !ignored.is_empty() {
            tracing::warn!(
                active = active.name(),
                ?ignored,
                "multiple credential shapes configured; using the first by precedence"
            );
        }
        Ok(active)
    }

    fn missing_reason(&self) -> String {
        let half = |a: &Option<Secret>, b: &Option<Secret>| {
            non_blank(a.as_ref()).is_some() != non_blank(b.as_ref()).is_some()
        };
        if half(&self.api_key, &self.api_secret) {
            "Incomplete credentials: API key and API secret must both be set".to_string()
        } else if half(&self.server_uuid, &self.server_secret) {
            "Incomplete credentials: server UUID and server secret must both be set".to_string()
        } else {
            "No credentials configured: set a token, an API key pair, server credentials, \
             a monitoring key, or a registration key"
                .to_string()
        }
    }
}

/// Header naming for server credentials.
///
/// One endpoint family of the remote API only accepts `Server-UUID`/`Server-Secret`
/// instead of the `X-` prefixed names used everywhere else. Service methods for that
/// family set [`ServerHeaderStyle::Unprefixed`] on their request. Remove once the
/// server accepts the prefixed names there.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ServerHeaderStyle {
    #[default]
    Prefixed,
    Unprefixed,
}

/// The resolved authentication scheme. Exactly one per client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer(Secret),
    ApiKey { key: Secret, secret: Secret },
    Server { uuid: Secret, secret: Secret },
    MonitoringKey(Secret),
    RegistrationKey(Secret),
}

impl AuthScheme {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::ApiKey { .. } => "api_key",
            Self::Server { .. } => "server",
            Self::MonitoringKey(_) => "monitoring_key",
            Self::RegistrationKey(_) => "registration_key",
        }
    }

    /// Insert this scheme's headers. Touches nothing else in `headers`.
    pub fn apply(&self, style: ServerHeaderStyle, headers: &mut HeaderMap) -> Result<(), Error> {
        match self {
            Self::Bearer(token) => {
                headers.insert(AUTHORIZATION, sensitive(&format!("Bearer {}", token.expose()))?);
            }
            Self::ApiKey { key, secret } => {
                insert(headers, "x-api-key", key)?;
                insert(headers, "x-api-secret", secret)?;
            }
            Self::Server { uuid, secret } => {
                let (uuid_name, secret_name) = match style {
                    ServerHeaderStyle::Prefixed => ("x-server-uuid", "x-server-secret"),
                    ServerHeaderStyle::Unprefixed => ("server-uuid", "server-secret"),
                };
                insert(headers, uuid_name, uuid)?;
                insert(headers, secret_name, secret)?;
            }
            Self::MonitoringKey(key) => insert(headers, "x-monitoring-key", key)?,
            Self::RegistrationKey(key) => insert(headers, "x-registration-key", key)?,
        }
        Ok(())
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &Secret) -> Result<(), Error> {
    headers.insert(HeaderName::from_static(name), sensitive(value.expose())?);
    Ok(())
}

fn sensitive(value: &str) -> Result<HeaderValue, Error> {
    let mut v = HeaderValue::from_str(value).map_err(|_| {
        Error::Configuration("Credential contains characters not allowed in a header".to_string())
    })?;
    v.set_sensitive(true);
    Ok(v)
}
