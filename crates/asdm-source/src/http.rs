//! HTTP content source.

use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use ureq::Agent;

use crate::source::{ContentSource, ErrorStatus, SourceError, SourceErrorKind};

/// Backend identifier for error messages.
const BACKEND: &str = "Http";

/// Characters escaped in a URL path segment (RFC 3986 `pchar` complement).
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Default HTTP timeout in seconds.
const DEFAULT_TIMEOUT: u64 = 30;

/// Content source fetching from a static web server.
///
/// A location is appended to the base URL, so `/docs/en-us/site-tree.yml`
/// against `https://example.com` fetches
/// `https://example.com/docs/en-us/site-tree.yml`.
pub struct HttpSource {
    base_url: String,
    agent: Agent,
}

impl HttpSource {
    /// Create a source for `base_url` with the default timeout.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self::with_timeout(base_url, Duration::from_secs(DEFAULT_TIMEOUT))
    }

    /// Create a source for `base_url` with a custom request timeout.
    #[must_use]
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();

        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            agent,
        }
    }

    /// Build the URL for a location, percent-encoding each path segment.
    fn url(&self, location: &str) -> String {
        let path = location
            .trim_start_matches('/')
            .split('/')
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");
        format!("{}/{path}", self.base_url)
    }
}

/// Map a non-success HTTP status to an error category and retry guidance.
fn status_error(status: u16) -> (SourceErrorKind, ErrorStatus) {
    match status {
        404 | 410 => (SourceErrorKind::NotFound, ErrorStatus::Permanent),
        401 | 403 => (SourceErrorKind::PermissionDenied, ErrorStatus::Permanent),
        408 => (SourceErrorKind::Timeout, ErrorStatus::Temporary),
        429 => (SourceErrorKind::RateLimited, ErrorStatus::Persistent),
        500..=599 => (SourceErrorKind::Unavailable, ErrorStatus::Persistent),
        _ => (SourceErrorKind::Other, ErrorStatus::Permanent),
    }
}

/// Map a transport error to a source error.
fn transport_error(err: ureq::Error, location: &str) -> SourceError {
    let (kind, status) = match &err {
        ureq::Error::Timeout(_) => (SourceErrorKind::Timeout, ErrorStatus::Temporary),
        ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
            (SourceErrorKind::Unavailable, ErrorStatus::Temporary)
        }
        _ => (SourceErrorKind::Other, ErrorStatus::Permanent),
    };
    SourceError::new(kind)
        .with_status(status)
        .with_backend(BACKEND)
        .with_location(location)
        .with_source(err)
}

impl ContentSource for HttpSource {
    fn read(&self, location: &str) -> Result<String, SourceError> {
        let url = self.url(location);
        tracing::debug!(%url, "Fetching");

        let response = self
            .agent
            .get(&url)
            .call()
            .map_err(|e| transport_error(e, location))?;

        let status = response.status().as_u16();
        if status >= 400 {
            let (kind, retry) = status_error(status);
            tracing::debug!(%url, status, "Fetch failed");
            return Err(SourceError::new(kind)
                .with_status(retry)
                .with_backend(BACKEND)
                .with_location(location));
        }

        response
            .into_body()
            .read_to_string()
            .map_err(|e| transport_error(e, location))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
