//! Stateless codecs shared by the platform integrations.

/// Base64 conditional stream wrapper and body/media-type helpers.
pub mod binary;
/// Conversions between [`HeaderMap`](crate::HeaderMap) and platform header maps.
pub mod header;
/// Query string construction and path segment encoding.
pub mod query;
