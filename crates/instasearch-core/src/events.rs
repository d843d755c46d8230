use serde::Serialize;
use serde_json::Value;

/// Emitted when the search API answers outside the 2xx range or with an
/// unreadable body.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FailedSearchQuery {
    pub response_code: u16,
    pub json: Value,
}

/// Emitted after every successful round trip (never for cache hits).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletedSearchQuery {
    pub args: Value,
    pub response: Value,
    pub response_code: u16,
    /// Round-trip wall-clock time in milliseconds.
    pub elapsed_time: f64,
    /// Time the search backend reported spending, in milliseconds.
    pub es_time: Option<f64>,
    pub url: String,
}

/// Fire-and-forget observer for search queries. Implementations must not
/// influence the outcome of the query.
pub trait SearchEventSink: Send + Sync {
    fn search_query_failed(&self, _event: &FailedSearchQuery) {}

    fn search_query_completed(&self, _event: &CompletedSearchQuery) {}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopEventSink;

impl SearchEventSink for NoopEventSink {}

#[derive(Clone, Copy, Debug, Default)]
pub struct TracingEventSink;

impl SearchEventSink for TracingEventSink {
    fn search_query_failed(&self, event: &FailedSearchQuery) {
        tracing::warn!(
            response_code = event.response_code,
            json = %event.json,
            "search query failed"
        );
    }

    fn search_query_completed(&self, event: &CompletedSearchQuery) {
        tracing::info!(
            response_code = event.response_code,
            elapsed_ms = event.elapsed_time,
            es_time_ms = ?event.es_time,
            url = %event.url,
            "search query completed"
        );
    }
}
