//! Public types for the hcache API.

mod descriptor;

pub use descriptor::{Headers, MIN_TTL, PreparedRequest, RequestDescriptor};
