//! Client for the remote harmful-content detection service.
//!
//! [`DetectorClient::analyze`] is the single entry point: it validates the
//! input, issues one `POST /api/detect`, and interprets the response. Any
//! failure past validation (no endpoint configured, connection error,
//! non-2xx status, unreadable body) degrades to a deterministic local
//! verdict from the [`fallback`] module instead of surfacing an error, so
//! the caller always has something to render. The cause travels alongside
//! the result for a non-fatal notice.

mod errors;
pub mod fallback;

use std::sync::OnceLock;

use serde::Serialize;

use vigil_types::{AnalysisResult, truncate_with_ellipsis};

pub use errors::{TransportError, ValidationError};

/// Header that suppresses tunnel-provider warning interstitials, which would
/// otherwise arrive as an HTML body instead of the JSON verdict.
const SKIP_BROWSER_WARNING_HEADER: &str = "ngrok-skip-browser-warning";

/// Cap on response-body text captured into a status error.
const MAX_ERROR_DETAIL_CHARS: usize = 200;

/// Process-wide HTTP client, reused across analyses. Transport defaults
/// only: no per-request timeout, no redirect policy override, so local and
/// tunnelled backends both work.
fn http_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

/// Where the detection backend lives. Trailing slashes are stripped at
/// construction so path joins stay predictable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    base_url: String,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self { base_url }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn detect_url(&self) -> String {
        format!("{}/api/detect", self.base_url)
    }
}

/// Why a verdict was synthesized locally instead of fetched.
#[derive(Debug)]
pub enum FallbackCause {
    /// No backend address was configured at all.
    NotConfigured,
    /// The backend was configured but the request failed.
    Transport(TransportError),
}

impl FallbackCause {
    /// Human-readable reason suitable for a transient notice.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::NotConfigured => {
                "no backend configured; showing an example verdict".to_string()
            }
            Self::Transport(err) => format!("backend unavailable: {err}"),
        }
    }
}

/// How the verdict in an [`AnalysisOutcome`] was produced.
#[derive(Debug)]
pub enum ResultOrigin {
    Backend,
    Fallback(FallbackCause),
}

/// A completed analysis: the verdict plus where it came from.
#[derive(Debug)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    pub origin: ResultOrigin,
}

#[derive(Serialize)]
struct DetectRequest<'a> {
    text: &'a str,
}

/// Client for the `/api/detect` endpoint.
#[derive(Debug, Clone, Default)]
pub struct DetectorClient {
    endpoint: Option<EndpointConfig>,
}

impl DetectorClient {
    #[must_use]
    pub fn new(endpoint: Option<EndpointConfig>) -> Self {
        Self { endpoint }
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.endpoint.is_some()
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&EndpointConfig> {
        self.endpoint.as_ref()
    }

    /// Analyze `text`, returning a verdict from the backend or the local
    /// fallback generator.
    ///
    /// The input is trimmed first; empty-after-trim input is the only error
    /// this function returns, and it is raised before any network traffic.
    /// One request, no retries.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisOutcome, ValidationError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ValidationError);
        }

        let Some(endpoint) = &self.endpoint else {
            return Ok(fallback_outcome(trimmed, FallbackCause::NotConfigured));
        };

        match request_verdict(endpoint, trimmed).await {
            Ok(result) => Ok(AnalysisOutcome {
                result,
                origin: ResultOrigin::Backend,
            }),
            Err(err) => {
                tracing::warn!("Detection request failed, synthesizing fallback verdict: {err}");
                Ok(fallback_outcome(trimmed, FallbackCause::Transport(err)))
            }
        }
    }
}

async fn request_verdict(
    endpoint: &EndpointConfig,
    trimmed: &str,
) -> Result<AnalysisResult, TransportError> {
    let url = endpoint.detect_url();
    tracing::debug!(%url, "Sending detection request");

    let response = http_client()
        .post(&url)
        .header(SKIP_BROWSER_WARNING_HEADER, "true")
        .json(&DetectRequest { text: trimmed })
        .send()
        .await
        .map_err(|source| TransportError::Connection {
            url: url.clone(),
            source,
        })?;

    let status = response.status();
    tracing::debug!(%status, "Detection response received");
    let body = response
        .text()
        .await
        .map_err(|source| TransportError::Connection { url, source })?;

    if !status.is_success() {
        return Err(TransportError::Status {
            status,
            detail: truncate_with_ellipsis(&body, MAX_ERROR_DETAIL_CHARS),
        });
    }

    serde_json::from_str(&body).map_err(TransportError::Malformed)
}

fn fallback_outcome(trimmed: &str, cause: FallbackCause) -> AnalysisOutcome {
    AnalysisOutcome {
        result: fallback::fallback_result(trimmed, now_timestamp()),
        origin: ResultOrigin::Fallback(cause),
    }
}

/// RFC 3339 timestamp for result creation.
#[must_use]
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::EndpointConfig;

    #[test]
    fn endpoint_strips_one_trailing_slash() {
        let endpoint = EndpointConfig::new("https://example.test/");
        assert_eq!(endpoint.base_url(), "https://example.test");
    }

    #[test]
    fn endpoint_strips_repeated_trailing_slashes() {
        let endpoint = EndpointConfig::new("https://example.test///");
        assert_eq!(endpoint.base_url(), "https://example.test");
    }

    #[test]
    fn endpoint_without_slash_unchanged() {
        let endpoint = EndpointConfig::new("https://example.test");
        assert_eq!(endpoint.base_url(), "https://example.test");
    }

    #[test]
    fn endpoint_trims_whitespace() {
        let endpoint = EndpointConfig::new("  https://example.test/ ");
        assert_eq!(endpoint.base_url(), "https://example.test");
    }

    #[test]
    fn detect_url_joins_single_path() {
        let endpoint = EndpointConfig::new("https://example.test/");
        assert_eq!(endpoint.detect_url(), "https://example.test/api/detect");
    }
}
