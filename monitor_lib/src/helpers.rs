//! Helpers for URL building, query encoding and header time values.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;
use url::Url;

/// Validate a base URL: absolute, http or https. Returned without a trailing slash.
pub fn parse_base_url(base: &str) -> Result<String, String> {
    let trimmed = base.trim();
    let parsed = Url::parse(trimmed).map_err(|e| format!("Invalid base URL {:?}: {}", trimmed, e))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => return Err(format!("Unsupported URL scheme: {}", other)),
    }
    if parsed.host_str().is_none() {
        return Err(format!("Base URL has no host: {}", trimmed));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Encode ordered query pairs as `k=v&k=v`, preserving the given order.
pub fn encode_query(pairs: &[(String, String)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Join base URL, path and query into the request URL.
pub fn build_url(base: &str, path: &str, query: &[(String, String)]) -> String {
    let mut url = String::with_capacity(base.len() + path.len() + 16);
    url.push_str(base.trim_end_matches('/'));
    if !path.starts_with('/') {
        url.push('/');
    }
    url.push_str(path);
    if !query.is_empty() {
        url.push(if path.contains('?') { '&' } else { '?' });
        url.push_str(&encode_query(query));
    }
    url
}

/// `X-RateLimit-Reset`: unix seconds, or an RFC 3339 timestamp (a missing offset
/// reads as UTC).
pub fn parse_rate_limit_reset(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").map(|t| t.and_utc()))
        .ok()
}

/// `Retry-After`: delay in seconds, or an HTTP date.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();
    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
    let wait = (at - Utc::now()).num_milliseconds().max(0);
    Some(Duration::from_millis(wait as u64))
}
