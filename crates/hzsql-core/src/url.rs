//! `jdbc:hazelcast://` endpoint parsing.
//!
//! A [`JdbcUrl`] is the identity under which connections are shared:
//!
//! ```text
//! jdbc:hazelcast://<host>[:<port>]/<schema>[?<key>=<value>&...]
//! ```
//!
//! Host, port and schema are informational. Two urls are the same identity
//! only when their raw strings and their properties are identical, so
//! `jdbc:hazelcast://h/s` and `jdbc:hazelcast://H/s` never share a connection.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;

/// Scheme prefix claimed by this driver.
pub const URL_PREFIX: &str = "jdbc:hazelcast://";

/// Connection properties, ordered by key so identities hash deterministically.
pub type Properties = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    /// Not a `jdbc:hazelcast://` url. Callers should hand the string to another driver.
    #[error("url not accepted by this driver: {0}")]
    NotAcceptable(String),
    #[error("missing schema in url: {0}")]
    MalformedSchema(String),
    #[error("invalid port '{port}' in url: {url}")]
    InvalidPort { url: String, port: String },
}

impl UrlError {
    /// Whether this is the "not our url" routing signal rather than a real failure.
    pub fn is_not_acceptable(&self) -> bool {
        matches!(self, UrlError::NotAcceptable(_))
    }
}

/// Parsed `jdbc:hazelcast://` endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct JdbcUrl {
    host: String,
    port: Option<u32>,
    schema: String,
    properties: Properties,
    raw_url: String,
}

impl JdbcUrl {
    /// Parse `url`, layering its query parameters over `info`.
    ///
    /// Query parameters win over entries of `info` with the same key.
    /// Malformed `key=value` pairs are dropped, never reported.
    pub fn parse(url: &str, info: Option<&Properties>) -> Result<Self, UrlError> {
        let matched = scan(url)?;

        let port = matched
            .port
            .map(|digits| {
                // Accepted range is that of a signed 32-bit integer.
                digits
                    .parse::<i32>()
                    .ok()
                    .and_then(|port| u32::try_from(port).ok())
                    .ok_or_else(|| UrlError::InvalidPort {
                        url: url.to_string(),
                        port: digits.to_string(),
                    })
            })
            .transpose()?;

        let mut properties = info.cloned().unwrap_or_default();
        if let Some(parameters) = matched.parameters {
            parse_parameters(parameters, &mut properties);
        }

        Ok(Self {
            host: matched.host.to_string(),
            port,
            schema: matched.schema.to_string(),
            properties,
            raw_url: url.to_string(),
        })
    }

    /// Whether `url` matches the `jdbc:hazelcast://` grammar.
    pub fn accepts(url: &str) -> bool {
        scan(url).is_ok()
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port as written in the url, at most `i32::MAX`. Not range-checked against 65535.
    pub fn port(&self) -> Option<u32> {
        self.port
    }

    /// `host` or `host:port`.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// The string this url was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw_url
    }

    /// Rebuild a url from host, port, schema and properties (in key order).
    pub fn canonical(&self) -> String {
        let mut out = format!("{URL_PREFIX}{}/{}", self.authority(), self.schema);
        let mut separator = '?';
        for (key, value) in &self.properties {
            out.push(separator);
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            separator = '&';
        }
        out
    }
}

impl PartialEq for JdbcUrl {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties && self.raw_url == other.raw_url
    }
}

impl Eq for JdbcUrl {}

impl Hash for JdbcUrl {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.properties.hash(state);
        self.raw_url.hash(state);
    }
}

impl fmt::Display for JdbcUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw_url)
    }
}

impl FromStr for JdbcUrl {
    type Err = UrlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, None)
    }
}

// ── Scanner ──────────────────────────────────────────────────────────

/// Url components, borrowed from the input.
#[derive(Debug, PartialEq, Eq)]
struct Matched<'a> {
    host: &'a str,
    port: Option<&'a str>,
    schema: &'a str,
    parameters: Option<&'a str>,
}

/// Whitespace as excluded by the grammar's "non-whitespace" runs.
fn is_url_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\u{0B}' | '\u{0C}' | '\r')
}

/// Match the whole of `url` against the endpoint grammar.
///
/// The host is the shortest non-empty prefix followed by `:` or `/` for
/// which the rest of the url still matches, so `a:b/s` has host `a:b`.
fn scan(url: &str) -> Result<Matched<'_>, UrlError> {
    let not_acceptable = || UrlError::NotAcceptable(url.to_string());

    let rest = url.strip_prefix(URL_PREFIX).ok_or_else(not_acceptable)?;
    if rest.is_empty() || rest.contains(is_url_whitespace) {
        return Err(not_acceptable());
    }

    for (i, c) in rest.char_indices().skip(1) {
        if c != ':' && c != '/' {
            continue;
        }
        if let Some((port, path)) = scan_authority_tail(&rest[i..]) {
            let (schema, parameters) = split_schema(path);
            return Ok(Matched {
                host: &rest[..i],
                port,
                schema,
                parameters,
            });
        }
    }

    Err(UrlError::MalformedSchema(url.to_string()))
}

/// Match `[":" digits] "/" path` with a non-empty path.
fn scan_authority_tail(s: &str) -> Option<(Option<&str>, &str)> {
    if let Some(after_colon) = s.strip_prefix(':') {
        let digits_len = after_colon
            .bytes()
            .take_while(u8::is_ascii_digit)
            .count();
        if digits_len == 0 {
            return None;
        }
        let path = after_colon[digits_len..].strip_prefix('/')?;
        return (!path.is_empty()).then_some((Some(&after_colon[..digits_len]), path));
    }
    let path = s.strip_prefix('/')?;
    (!path.is_empty()).then_some((None, path))
}

/// Split a non-empty path into schema and query.
///
/// The schema is at least one character long, so a `?` in first position
/// belongs to the schema.
fn split_schema(path: &str) -> (&str, Option<&str>) {
    match path.char_indices().skip(1).find(|&(_, c)| c == '?') {
        Some((i, _)) => (&path[..i], Some(&path[i + 1..])),
        None => (path, None),
    }
}

/// Decode `a=1&b=2` into `properties`.
///
/// A pair is kept only if splitting on `=` yields exactly two non-empty parts.
fn parse_parameters(parameters: &str, properties: &mut Properties) {
    for parameter in parameters.split('&') {
        let mut parts = parameter.split('=');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(key), Some(value), None) if !key.is_empty() && !value.is_empty() => {
                properties.insert(key.to_string(), value.to_string());
            }
            _ => {
                tracing::debug!(parameter, "dropped malformed url parameter");
            }
        }
    }
}
