//! Conversions between [`CacheError`] and [`tonic::Status`].
//!
//! Server side: errors become a status code, the error text and a
//! [`proto::ErrorDetail`] in the status details. Client side: the detail is
//! decoded back into the same [`CacheError`]; statuses without one (e.g.
//! transport failures) map onto the closest variant by code.

use std::time::Duration;

use bytes::Bytes;
use prost::Message;
use tonic::{Code, Status};

use super::proto;
use super::proto::error_detail::Kind;
use crate::CacheError;

impl From<&CacheError> for proto::ErrorDetail {
    fn from(err: &CacheError) -> Self {
        let kind = match err {
            CacheError::Decode(msg) => Kind::Decode(msg.clone()),
            CacheError::InvalidHeader { index, header } => {
                Kind::InvalidHeader(proto::InvalidHeader {
                    index: *index as u32,
                    header: header.clone(),
                })
            }
            CacheError::TtlTooLow { ttl } => Kind::TtlTooLow(*ttl),
            CacheError::InvalidRequest(msg) => Kind::InvalidRequest(msg.clone()),
            CacheError::Http(msg) => Kind::Http(msg.clone()),
            CacheError::FetchTimeout(timeout) => Kind::FetchTimeoutMs(timeout.as_millis() as u64),
            CacheError::Configuration(msg) => Kind::Configuration(msg.clone()),
            CacheError::Closed => Kind::Closed(true),
        };
        proto::ErrorDetail { kind: Some(kind) }
    }
}

impl From<Kind> for CacheError {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Decode(msg) => CacheError::Decode(msg),
            Kind::InvalidHeader(h) => CacheError::InvalidHeader {
                index: h.index as usize,
                header: h.header,
            },
            Kind::TtlTooLow(ttl) => CacheError::TtlTooLow { ttl },
            Kind::InvalidRequest(msg) => CacheError::InvalidRequest(msg),
            Kind::Http(msg) => CacheError::Http(msg),
            Kind::FetchTimeoutMs(ms) => CacheError::FetchTimeout(Duration::from_millis(ms)),
            Kind::Configuration(msg) => CacheError::Configuration(msg),
            Kind::Closed(_) => CacheError::Closed,
        }
    }
}

/// Convert a cache error into the status returned to RPC callers.
pub fn to_status(err: CacheError) -> Status {
    let code = if err.is_rejection() {
        Code::InvalidArgument
    } else {
        match &err {
            CacheError::FetchTimeout(_) => Code::DeadlineExceeded,
            CacheError::InvalidRequest(_) | CacheError::Http(_) => Code::Unavailable,
            _ => Code::Internal,
        }
    };
    let details = proto::ErrorDetail::from(&err).encode_to_vec();
    Status::with_details(code, err.to_string(), Bytes::from(details))
}

/// Convert a status received from `hcached` back into a cache error.
///
/// Statuses carrying an [`proto::ErrorDetail`] yield the server's error
/// unchanged. Others keep their message verbatim: `INVALID_ARGUMENT`
/// becomes [`CacheError::Decode`], everything else [`CacheError::Http`].
pub fn from_status(status: Status) -> CacheError {
    let kind = proto::ErrorDetail::decode(status.details())
        .ok()
        .and_then(|detail| detail.kind);
    if let Some(kind) = kind {
        return kind.into();
    }

    let message = status.message().to_string();
    match status.code() {
        Code::InvalidArgument => CacheError::Decode(message),
        _ => CacheError::Http(message),
    }
}
