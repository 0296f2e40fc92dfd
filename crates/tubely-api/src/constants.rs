//! HTTP-level constants

/// Prefix of every JSON API route.
pub const API_PREFIX: &str = "/api";

/// Slack allowed on top of a field's size cap for multipart framing and headers.
pub const MULTIPART_OVERHEAD_BYTES: usize = 1 << 20;
