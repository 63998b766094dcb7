//! Object storage backend implementations.

pub mod azure;
pub mod s3;
