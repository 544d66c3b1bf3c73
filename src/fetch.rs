//! Image downloads.
//!
//! [`ImageFetcher::fetch`] never returns an error: every failure mode is folded
//! into [`FetchResult::Failed`] so one bad URL cannot disturb the rest of a run.

use std::io::Read;
use std::time::Duration;

use serde::Serialize;

/// Why a download produced no image bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum FetchFailure {
    /// The server answered outside the 2xx range.
    #[error("HTTP status {0}")]
    Status(u16),
    /// DNS, connect, TLS, timeout or protocol failure.
    #[error("transport: {0}")]
    Transport(String),
    /// The body could not be read to the end.
    #[error("reading body: {0}")]
    Body(String),
    /// A 2xx answer without a body.
    #[error("empty body")]
    EmptyBody,
}

/// Outcome of a single download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchResult {
    Fetched { bytes: Vec<u8> },
    Failed { reason: FetchFailure },
}

impl FetchResult {
    pub fn failed(reason: FetchFailure) -> Self {
        Self::Failed { reason }
    }

    #[must_use]
    pub fn is_fetched(&self) -> bool {
        matches!(self, Self::Fetched { .. })
    }
}

/// Source of image bytes. Implementations must not cache across calls.
pub trait ImageFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> FetchResult;
}

impl<F: ImageFetcher + ?Sized> ImageFetcher for &F {
    fn fetch(&self, url: &str, timeout: Duration) -> FetchResult {
        (**self).fetch(url, timeout)
    }
}

/// Blocking HTTP GET with a per-request timeout and no retries.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    user_agent: Option<String>,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn agent(&self, timeout: Duration) -> ureq::Agent {
        let mut builder = ureq::AgentBuilder::new().timeout(timeout);
        if let Some(ref ua) = self.user_agent {
            builder = builder.user_agent(ua);
        }
        builder.build()
    }
}

impl ImageFetcher for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> FetchResult {
        let response = match self.agent(timeout).get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return FetchResult::failed(FetchFailure::Status(code));
            }
            Err(ureq::Error::Transport(transport)) => {
                return FetchResult::failed(FetchFailure::Transport(transport.to_string()));
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return FetchResult::failed(FetchFailure::Status(status));
        }

        let mut bytes = Vec::new();
        if let Err(e) = response.into_reader().read_to_end(&mut bytes) {
            return FetchResult::failed(FetchFailure::Body(e.to_string()));
        }
        if bytes.is_empty() {
            return FetchResult::failed(FetchFailure::EmptyBody);
        }

        FetchResult::Fetched { bytes }
    }
}
