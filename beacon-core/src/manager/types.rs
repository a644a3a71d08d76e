use hyper::{Method, StatusCode, Uri};
use std::time::Duration;

/// What the middleware observed about one finished request
#[derive(Debug, Clone)]
pub struct RequestRecord {
    pub method: Method,
    pub uri: Uri,
    pub status: StatusCode,
    /// Response body length, when the body knows it up front
    pub response_size: Option<u64>,
    /// Time spent in the downstream handler
    pub latency: Duration,
}

impl RequestRecord {
    pub fn new(method: Method, uri: Uri, status: StatusCode) -> Self {
        Self {
            method,
            uri,
            status,
            response_size: None,
            latency: Duration::ZERO,
        }
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.response_size = size;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

/// Version and build identity reported once at registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: String,
    /// VCS revision or other build identifier
    pub build_hash: String,
    pub build_time: String,
}

impl BuildInfo {
    pub fn new(
        version: impl Into<String>,
        build_hash: impl Into<String>,
        build_time: impl Into<String>,
    ) -> Self {
        Self {
            version: version.into(),
            build_hash: build_hash.into(),
            build_time: build_time.into(),
        }
    }
}
