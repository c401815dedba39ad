//! HTTP layer shared by every backend: client construction, status checks,
//! JSON decoding.
//!
//! This is the only place that turns HTTP statuses into errors. Providers
//! state which status they expect and whether the call was a dispatch or a
//! poll; no request is ever retried.

use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use scan_test_core::{Result, ScanTestError};

pub(crate) const USER_AGENT_VALUE: &str = concat!("scan-test/", env!("CARGO_PKG_VERSION"));

/// Which side of the protocol a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CallKind {
    Dispatch,
    Poll,
}

/// HTTP client bound to one backend's base URL and default headers.
///
/// Owned by its provider; dropping the provider releases the connection pool.
#[derive(Debug, Clone)]
pub(crate) struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub(crate) fn new(base_url: &str, mut headers: HeaderMap) -> Result<Self> {
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ScanTestError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }
}

/// Build a header value from configuration text (tokens, credentials).
pub(crate) fn header_value(value: &str, what: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value)
        .map_err(|_| ScanTestError::Config(format!("{what} contains invalid header characters")))?;
    header.set_sensitive(true);
    Ok(header)
}

/// Send a request, mapping transport failures to [`ScanTestError::Http`].
pub(crate) async fn send(request: RequestBuilder, action: &str) -> Result<Response> {
    request
        .send()
        .await
        .map_err(|e| ScanTestError::Http(format!("failed to {action}: {e}")))
}

/// Fail unless the response status is one of `accepted`.
///
/// The error embeds the status code and the response body.
pub(crate) async fn expect_status(
    response: Response,
    accepted: &[StatusCode],
    kind: CallKind,
    action: &str,
) -> Result<Response> {
    let status = response.status();
    if accepted.contains(&status) {
        debug!(status = status.as_u16(), action, "request accepted");
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let action = action.to_string();
    let status = status.as_u16();

    Err(match kind {
        CallKind::Dispatch => ScanTestError::Dispatch {
            action,
            status,
            body,
        },
        CallKind::Poll => ScanTestError::Api {
            action,
            status,
            body,
        },
    })
}

/// Decode a JSON body, mapping failures to [`ScanTestError::InvalidResponse`].
pub(crate) async fn json_body<T: DeserializeOwned>(response: Response, what: &str) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| ScanTestError::Http(format!("failed to read {what}: {e}")))?;

    serde_json::from_str(&text)
        .map_err(|e| ScanTestError::InvalidResponse(format!("failed to parse {what}: {e}")))
}

/// Seconds between two timestamps, never negative.
pub(crate) fn elapsed_secs(
    start: chrono::DateTime<chrono::Utc>,
    end: Option<chrono::DateTime<chrono::Utc>>,
) -> f64 {
    end.map(|end| (end - start).num_milliseconds() as f64 / 1000.0)
        .unwrap_or(0.0)
        .max(0.0)
}
