//! Network request log.
//!
//! The host wraps its request-issuing mechanisms (`fetch` and
//! `XMLHttpRequest`) and reports each request through
//! [`TelemetrySink::request_started`](super::TelemetrySink::request_started).
//! The returned [`PendingRequest`] measures duration from issue to settle and
//! writes exactly one entry when it completes or fails.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::util::truncate_chars;

use super::TelemetryLogs;

// ============================================================================
// Types
// ============================================================================

/// Which request mechanism issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestApi {
    /// `fetch()`.
    Fetch,
    /// `XMLHttpRequest`.
    Xhr,
}

/// A request as issued.
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkRequest {
    /// Issuing mechanism.
    pub api: RequestApi,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// Request headers.
    pub headers: BTreeMap<String, String>,
    /// Request body, if any.
    pub body: Option<String>,
}

impl NetworkRequest {
    /// Creates a request without headers or body.
    #[must_use]
    pub fn new(api: RequestApi, method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            api,
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }
}

/// A settled response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkResponse {
    /// HTTP status.
    pub status: u16,
    /// Status text.
    pub status_text: String,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Response body, if readable.
    pub body: Option<String>,
}

/// One logged request/response pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkRecord {
    /// Issuing mechanism.
    pub api: RequestApi,
    /// HTTP method.
    pub method: String,
    /// Request URL.
    pub url: String,
    /// HTTP status, absent when the request errored.
    pub status: Option<u16>,
    /// Status text.
    pub status_text: Option<String>,
    /// Request headers.
    pub request_headers: BTreeMap<String, String>,
    /// Response headers.
    pub response_headers: BTreeMap<String, String>,
    /// Request body, truncated.
    pub request_body: Option<String>,
    /// Response body, truncated.
    pub response_body: Option<String>,
    /// Milliseconds from issue to settle.
    pub duration: f64,
    /// Transport error message.
    pub error: Option<String>,
}

// ============================================================================
// PendingRequest
// ============================================================================

/// An in-flight request. Settle it exactly once.
#[must_use = "an unsettled request is never logged"]
pub struct PendingRequest {
    logs: Arc<TelemetryLogs>,
    request: NetworkRequest,
    started: Instant,
    body_chars: usize,
}

impl PendingRequest {
    pub(super) fn new(logs: Arc<TelemetryLogs>, request: NetworkRequest, body_chars: usize) -> Self {
        Self {
            logs,
            request,
            started: Instant::now(),
            body_chars,
        }
    }

    /// Records a completed response.
    pub fn complete(self, response: NetworkResponse) {
        let record = self.record(Some(response), None);
        self.logs.record_network(record);
    }

    /// Records a request that failed before a response arrived.
    pub fn fail(self, error: impl Into<String>) {
        let record = self.record(None, Some(error.into()));
        self.logs.record_network(record);
    }

    fn record(&self, response: Option<NetworkResponse>, error: Option<String>) -> NetworkRecord {
        let duration = self.started.elapsed().as_secs_f64() * 1000.0;
        let truncate = |body: &Option<String>| {
            body.as_deref()
                .map(|text| truncate_chars(text, self.body_chars))
        };

        trace!(method = %self.request.method, url = %self.request.url, duration, "Request settled");

        let (status, status_text, response_headers, response_body) = match response {
            Some(r) => (
                Some(r.status),
                Some(r.status_text),
                r.headers,
                truncate(&r.body),
            ),
            None => (None, None, BTreeMap::new(), None),
        };

        NetworkRecord {
            api: self.request.api,
            method: self.request.method.clone(),
            url: self.request.url.clone(),
            status,
            status_text,
            request_headers: self.request.headers.clone(),
            response_headers,
            request_body: truncate(&self.request.body),
            response_body,
            duration,
            error,
        }
    }
}

// ============================================================================
// Filter
// ============================================================================

/// Filter for network log retrieval.
#[derive(Debug, Default)]
pub struct NetworkFilter {
    /// Case-insensitive method match.
    pub method: Option<String>,
    /// URL pattern.
    pub url_pattern: Option<Regex>,
    /// Exact status match.
    pub status: Option<u16>,
    /// Only errored or >= 400 entries.
    pub errors_only: bool,
}

impl NetworkFilter {
    /// Returns `true` if the record passes the filter.
    #[must_use]
    pub fn matches(&self, record: &NetworkRecord) -> bool {
        if let Some(method) = &self.method
            && !record.method.eq_ignore_ascii_case(method)
        {
            return false;
        }
        if let Some(pattern) = &self.url_pattern
            && !pattern.is_match(&record.url)
        {
            return false;
        }
        if let Some(status) = self.status
            && record.status != Some(status)
        {
            return false;
        }
        if self.errors_only {
            return record.error.is_some() || record.status.is_some_and(|s| s >= 400);
        }
        true
    }
}

// ============================================================================
// Tests
// ============================================================================
