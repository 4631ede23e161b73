//! Error types for the detection client.

use thiserror::Error;

/// The input was empty after trimming. The only analyze error that blocks
/// the operation; raised before any network call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("enter text before analysis")]
pub struct ValidationError;

/// A detection request that reached the network and failed.
///
/// Never fatal: the client converts every variant into a fallback verdict
/// and carries the error along as the notice text.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {url} failed: {source}")]
    Connection {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-2xx response. `detail` holds at most 200 characters of the body.
    #[error("backend returned {status}: {detail}")]
    Status {
        status: reqwest::StatusCode,
        detail: String,
    },
    /// 2xx response whose body did not parse as a verdict.
    #[error("backend returned an unreadable verdict: {0}")]
    Malformed(#[from] serde_json::Error),
}
