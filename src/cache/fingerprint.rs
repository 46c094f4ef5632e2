//! Cache keys.

use std::fmt;

use xxhash_rust::xxh3::Xxh3;

use crate::fetch::FetchRequest;

/// Stable 64-bit identity of an upstream request; the cache key.
///
/// Derived from method, URL, body and headers. Headers are normalized
/// before hashing: names are lower-cased, names and values trimmed, and
/// the pairs sorted. Header order therefore never matters, whether the
/// client sent a mapping or a list of lines, and both forms of the same
/// header set share one entry. Every field is length-prefixed so that
/// moving bytes between adjacent fields changes the key.
///
/// The TTL is not part of the key: the first request for a fingerprint
/// decides the refresh interval of the entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u64);

impl Fingerprint {
    /// Compute the fingerprint of a validated request.
    pub fn of(request: &FetchRequest) -> Self {
        let mut headers: Vec<(String, &str)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.trim().to_ascii_lowercase(), value.trim()))
            .collect();
        headers.sort_unstable();

        let mut hasher = Xxh3::new();
        write_field(&mut hasher, request.method.as_bytes());
        write_field(&mut hasher, request.url.as_bytes());
        write_field(&mut hasher, request.body.as_bytes());
        hasher.update(&(headers.len() as u64).to_le_bytes());
        for (name, value) in &headers {
            write_field(&mut hasher, name.as_bytes());
            write_field(&mut hasher, value.as_bytes());
        }
        Fingerprint(hasher.digest())
    }
}

fn write_field(hasher: &mut Xxh3, bytes: &[u8]) {
    hasher.update(&(bytes.len() as u64).to_le_bytes());
    hasher.update(bytes);
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, url: &str, body: &str, headers: &[(&str, &str)]) -> FetchRequest {
        FetchRequest {
            method: method.into(),
            url: url.into(),
            body: body.into(),
            headers: headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn deterministic() {
        let a = request("GET", "http://x/", "", &[("Accept", "*/*")]);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&a.clone()));
    }

    #[test]
    fn header_order_is_ignored() {
        let a = request("GET", "http://x/", "", &[("A", "1"), ("B", "2")]);
        let b = request("GET", "http://x/", "", &[("B", "2"), ("A", "1")]);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn header_name_case_is_ignored() {
        let a = request("GET", "http://x/", "", &[("Accept", "text/html")]);
        let b = request("GET", "http://x/", "", &[("accept", "text/html")]);
        assert_eq!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn header_value_case_matters() {
        let a = request("GET", "http://x/", "", &[("X-Token", "abc")]);
        let b = request("GET", "http://x/", "", &[("X-Token", "ABC")]);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));
    }

    #[test]
    fn field_boundaries_do_not_alias() {
        let a = request("GET", "http://x/a", "b", &[]);
        let b = request("GET", "http://x/", "ab", &[]);
        assert_ne!(Fingerprint::of(&a), Fingerprint::of(&b));

        let c = request("GET", "http://x/", "", &[("ab", "c")]);
        let d = request("GET", "http://x/", "", &[("a", "bc")]);
        assert_ne!(Fingerprint::of(&c), Fingerprint::of(&d));
    }

    #[test]
    fn display_is_zero_padded_hex() {
        assert_eq!(Fingerprint(0xab).to_string(), "00000000000000ab");
    }
}
