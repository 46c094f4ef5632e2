//! Inbound request descriptor and its validation.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::fetch::FetchRequest;
use crate::{CacheError, Result};

/// Shortest refresh interval a cache entry may be created with.
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// Request headers as sent by a client.
///
/// Either a `name → value` mapping or a list of `"Name: Value"` lines.
/// Both forms are normalized the same way before fingerprinting, see
/// [`Fingerprint`](crate::cache::Fingerprint).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Headers {
    Map(HashMap<String, String>),
    List(Vec<String>),
}

impl Default for Headers {
    fn default() -> Self {
        Headers::Map(HashMap::new())
    }
}

impl Headers {
    /// Parse into trimmed `(name, value)` pairs.
    ///
    /// List lines must contain exactly one `:` separator.
    pub fn parse(&self) -> Result<Vec<(String, String)>> {
        match self {
            Headers::Map(map) => Ok(map
                .iter()
                .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
                .collect()),
            Headers::List(lines) => lines
                .iter()
                .enumerate()
                .map(|(index, line)| parse_header_line(index, line))
                .collect(),
        }
    }

    /// Number of header entries (not validated).
    pub fn len(&self) -> usize {
        match self {
            Headers::Map(map) => map.len(),
            Headers::List(lines) => lines.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn parse_header_line(index: usize, line: &str) -> Result<(String, String)> {
    let mut parts = line.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(name), Some(value), None) => Ok((name.trim().to_string(), value.trim().to_string())),
        _ => Err(CacheError::InvalidHeader {
            index,
            header: line.to_string(),
        }),
    }
}

/// A request to cache, as decoded from an inbound call.
///
/// ```rust
/// # use hcache::RequestDescriptor;
/// let descriptor = RequestDescriptor::new("http://example.com/")
///     .header("Accept", "application/json")
///     .ttl(30);
/// assert_eq!(descriptor.method, "GET");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    #[serde(default = "default_method")]
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "nullable_headers")]
    pub headers: Headers,
    /// Refresh interval in seconds.
    pub ttl: u64,
}

fn default_method() -> String {
    "GET".to_string()
}

fn nullable_headers<'de, D>(deserializer: D) -> std::result::Result<Headers, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Headers>::deserialize(deserializer)?.unwrap_or_default())
}

impl RequestDescriptor {
    /// A `GET` request for `url` with a one-second TTL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            method: default_method(),
            url: url.into(),
            body: String::new(),
            headers: Headers::default(),
            ttl: 1,
        }
    }

    /// Decode a JSON encoded descriptor.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Add a header, keeping the form (mapping or list) already in use.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let (name, value) = (name.into(), value.into());
        match &mut self.headers {
            Headers::Map(map) => {
                map.insert(name, value);
            }
            Headers::List(lines) => lines.push(format!("{name}: {value}")),
        }
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    pub fn ttl(mut self, seconds: u64) -> Self {
        self.ttl = seconds;
        self
    }

    /// Validate the descriptor and turn it into fetch parameters.
    ///
    /// Rejects header lines without exactly one separator and TTLs below
    /// [`MIN_TTL`]. The method is upper-cased.
    pub fn prepare(&self) -> Result<PreparedRequest> {
        let headers = self.headers.parse()?;
        let ttl = Duration::from_secs(self.ttl);
        if ttl < MIN_TTL {
            return Err(CacheError::TtlTooLow { ttl: self.ttl });
        }

        Ok(PreparedRequest {
            request: FetchRequest {
                method: self.method.to_uppercase(),
                url: self.url.clone(),
                body: self.body.clone(),
                headers,
            },
            ttl,
        })
    }
}

/// A validated descriptor: what to fetch and how often.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub request: FetchRequest,
    pub ttl: Duration,
}
