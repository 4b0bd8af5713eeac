//! # Source Error Taxonomy
//!
//! Every upstream fetch in this crate fails through one of the variants below.
//! The orchestrator catches all of them at the source boundary and converts
//! them to field-level nulls/sentinels; none of these errors ever escapes as
//! a failed overall report.

use thiserror::Error;

/// Errors produced while fetching or interpreting a single upstream source.
#[derive(Error, Debug)]
pub enum SourceError {
    /// Network failure, timeout, or non-2xx response before a usable body
    /// was obtained.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream responded, but the payload shape was not recognizable
    /// (empty body, missing header, no data rows, invalid JSON).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload was structurally valid but lacked every field we needed.
    #[error("missing field: {0}")]
    MissingField(String),

    /// The cache slot was empty and the refresh fetch also failed, so there
    /// is nothing to serve, not even stale data.
    #[error("cache empty and refresh failed")]
    StaleCacheMiss,
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        SourceError::UpstreamUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedPayload(err.to_string())
    }
}
