use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use instasearch_core::cache::{CacheResult, InMemorySearchCache, SearchCacheStore, fingerprint};
use instasearch_core::client::RemoteSearchClient;
use instasearch_core::clock::Clock;
use instasearch_core::events::{CompletedSearchQuery, FailedSearchQuery, SearchEventSink};
use instasearch_core::models::{SearchError, SearchErrorKind, SearchRequest};
use instasearch_core::options::RemoteSearchConfig;
use instasearch_core::transport::{
    HttpGetRequest, HttpResponse, SearchTransport, TransportResult,
};
use serde_json::{Map, Value, json};

struct ManualClock {
    now: Mutex<SystemTime>,
}

impl ManualClock {
    fn at(seconds: u64) -> Self {
        Self {
            now: Mutex::new(UNIX_EPOCH + Duration::from_secs(seconds)),
        }
    }

    fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        *self.now.lock().unwrap()
    }
}

struct ScriptedTransport {
    outcome: TransportResult<HttpResponse>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpGetRequest>>,
}

impl ScriptedTransport {
    fn responding(status: u16, body: &str) -> Self {
        Self::with_outcome(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }))
    }

    fn with_outcome(outcome: TransportResult<HttpResponse>) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SearchTransport for ScriptedTransport {
    fn get(&self, request: &HttpGetRequest) -> TransportResult<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    failed: Mutex<Vec<FailedSearchQuery>>,
    completed: Mutex<Vec<CompletedSearchQuery>>,
}

impl SearchEventSink for RecordingSink {
    fn search_query_failed(&self, event: &FailedSearchQuery) {
        self.failed.lock().unwrap().push(event.clone());
    }

    fn search_query_completed(&self, event: &CompletedSearchQuery) {
        self.completed.lock().unwrap().push(event.clone());
    }
}

struct FailingCache;

impl SearchCacheStore for FailingCache {
    fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(SearchError::storage("get", "disk on fire"))
    }

    fn set(&self, _key: &str, _value: &Value, _ttl: Duration) -> CacheResult<()> {
        Err(SearchError::storage("set", "disk on fire"))
    }
}

const AGGREGATION_BODY: &str = r#"{
    "took": 7,
    "aggregations": {
        "post_type_0": {"buckets": [{"key": "post", "doc_count": 12}]}
    }
}"#;

fn aggregation_request() -> SearchRequest {
    let mut spec = Map::new();
    spec.insert(
        "post_type_0".to_string(),
        json!({"terms": {"field": "post_type", "size": 5}}),
    );
    SearchRequest::aggregations_only(spec)
}

fn client_with(
    transport: Arc<ScriptedTransport>,
    cache: Arc<dyn SearchCacheStore>,
    sink: Arc<RecordingSink>,
) -> RemoteSearchClient {
    RemoteSearchClient::new(RemoteSearchConfig::default(), transport, cache).with_event_sink(sink)
}

#[test]
fn identical_requests_within_window_hit_network_once() {
    let transport = Arc::new(ScriptedTransport::responding(200, AGGREGATION_BODY));
    let cache = Arc::new(InMemorySearchCache::new());
    let sink = Arc::new(RecordingSink::default());
    let client = client_with(transport.clone(), cache, sink.clone());

    let first = client.execute(42, &aggregation_request()).unwrap();
    let second = client.execute(42, &aggregation_request()).unwrap();

    assert_eq!(transport.calls(), 1);
    assert_eq!(first.body().to_string(), second.body().to_string());
    assert!(!first.is_cached());
    assert!(second.is_cached());
    assert_eq!(sink.completed.lock().unwrap().len(), 1);
}

#[test]
fn cached_entry_expires_after_one_hour() {
    let clock = Arc::new(ManualClock::at(1_700_000_000));
    let transport = Arc::new(ScriptedTransport::responding(200, AGGREGATION_BODY));
    let cache = Arc::new(InMemorySearchCache::with_clock(clock.clone()));
    let client = client_with(transport.clone(), cache, Arc::new(RecordingSink::default()));

    client.execute(42, &aggregation_request()).unwrap();
    clock.advance(Duration::from_secs(59 * 60));
    client.execute(42, &aggregation_request()).unwrap();
    assert_eq!(transport.calls(), 1);

    clock.advance(Duration::from_secs(60));
    let refreshed = client.execute(42, &aggregation_request()).unwrap();
    assert_eq!(transport.calls(), 2);
    assert!(!refreshed.is_cached());
}

#[test]
fn non_success_statuses_fail_and_are_not_cached() {
    for status in [199_u16, 300, 404, 500] {
        let transport = Arc::new(ScriptedTransport::responding(
            status,
            r#"{"error": "unknown_blog"}"#,
        ));
        let cache = Arc::new(InMemorySearchCache::new());
        let sink = Arc::new(RecordingSink::default());
        let client = client_with(transport.clone(), cache.clone(), sink.clone());

        let error = client.execute(42, &aggregation_request()).unwrap_err();

        assert_eq!(error.kind, SearchErrorKind::InvalidResponse, "status {status}");
        assert_eq!(error.code(), "invalid_search_api_response");
        assert!(error.message.contains(&status.to_string()));
        assert!(cache.is_empty().unwrap(), "status {status} must not be cached");

        {
            let failed = sink.failed.lock().unwrap();
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].response_code, status);
            assert_eq!(failed[0].json, json!({"error": "unknown_blog"}));
            assert!(sink.completed.lock().unwrap().is_empty());
        }

        client.execute(42, &aggregation_request()).unwrap_err();
        assert_eq!(transport.calls(), 2);
    }
}

#[test]
fn success_statuses_are_cached() {
    for status in [200_u16, 204, 299] {
        let transport = Arc::new(ScriptedTransport::responding(status, AGGREGATION_BODY));
        let cache = Arc::new(InMemorySearchCache::new());
        let client = client_with(transport, cache.clone(), Arc::new(RecordingSink::default()));

        client.execute(42, &aggregation_request()).unwrap();

        let key = fingerprint(&aggregation_request().to_value());
        assert!(cache.get(&key).unwrap().is_some(), "status {status}");
    }
}

#[test]
fn transport_failure_propagates_without_caching() {
    let transport = Arc::new(ScriptedTransport::with_outcome(Err(
        SearchError::transport("operation timed out"),
    )));
    let cache = Arc::new(InMemorySearchCache::new());
    let sink = Arc::new(RecordingSink::default());
    let client = client_with(transport.clone(), cache.clone(), sink.clone());

    let error = client.execute(42, &aggregation_request()).unwrap_err();

    assert_eq!(error.kind, SearchErrorKind::Transport);
    assert!(cache.is_empty().unwrap());
    assert!(sink.failed.lock().unwrap().is_empty());
    assert!(sink.completed.lock().unwrap().is_empty());
}

#[test]
fn unparseable_success_body_is_a_parse_failure() {
    let transport = Arc::new(ScriptedTransport::responding(200, "<html>oops</html>"));
    let cache = Arc::new(InMemorySearchCache::new());
    let sink = Arc::new(RecordingSink::default());
    let client = client_with(transport, cache.clone(), sink.clone());

    let error = client.execute(42, &aggregation_request()).unwrap_err();

    assert_eq!(error.kind, SearchErrorKind::ParseFailure);
    assert!(cache.is_empty().unwrap());
    assert_eq!(sink.failed.lock().unwrap()[0].json, Value::Null);
}

#[test]
fn completed_event_reports_diagnostics() {
    let transport = Arc::new(ScriptedTransport::responding(200, AGGREGATION_BODY));
    let sink = Arc::new(RecordingSink::default());
    let client = client_with(
        transport.clone(),
        Arc::new(InMemorySearchCache::new()),
        sink.clone(),
    );

    let response = client.execute(42, &aggregation_request()).unwrap();

    let completed = sink.completed.lock().unwrap();
    let event = &completed[0];
    assert_eq!(event.response_code, 200);
    assert_eq!(event.es_time, Some(7.0));
    assert!(event.elapsed_time >= 0.0);
    assert_eq!(event.args, aggregation_request().to_value());
    assert_eq!(&event.response, response.body());
    assert!(event.url.starts_with(
        "https://public-api.wordpress.com/rest/v1.3/sites/42/search?"
    ));

    let round_trip = response.round_trip().unwrap();
    assert_eq!(round_trip.url, event.url);
    assert_eq!(round_trip.es_time, Some(7.0));
    assert_eq!(response.took(), Some(7.0));
}

#[test]
fn request_carries_timeout_user_agent_and_flattened_query() {
    let transport = Arc::new(ScriptedTransport::responding(200, AGGREGATION_BODY));
    let client = client_with(
        transport.clone(),
        Arc::new(InMemorySearchCache::new()),
        Arc::new(RecordingSink::default()),
    );

    client.execute(42, &aggregation_request()).unwrap();

    let requests = transport.requests.lock().unwrap();
    let request = &requests[0];
    assert_eq!(request.timeout, Duration::from_secs(10));
    assert_eq!(request.user_agent, "jetpack_search");

    let (endpoint, query) = request.url.split_once('?').unwrap();
    assert_eq!(
        endpoint,
        "https://public-api.wordpress.com/rest/v1.3/sites/42/search"
    );
    let mut pairs: Vec<_> = query.split('&').collect();
    pairs.sort_unstable();
    assert_eq!(
        pairs,
        [
            "aggregations[post_type_0][terms][field]=post_type",
            "aggregations[post_type_0][terms][size]=5",
            "from=0",
            "size=0",
        ]
    );
}

#[test]
fn oversized_cache_ttl_still_returns_the_response() {
    let transport = Arc::new(ScriptedTransport::responding(200, AGGREGATION_BODY));
    let cache = Arc::new(InMemorySearchCache::new());
    let sink = Arc::new(RecordingSink::default());
    let config = RemoteSearchConfig {
        cache_ttl_secs: u64::MAX,
        ..RemoteSearchConfig::default()
    };
    let client = RemoteSearchClient::new(config, transport.clone(), cache.clone())
        .with_event_sink(sink.clone());

    let response = client.execute(42, &aggregation_request()).unwrap();

    assert!(!response.is_cached());
    assert_eq!(response.took(), Some(7.0));
    assert!(cache.is_empty().unwrap());
    assert_eq!(sink.completed.lock().unwrap().len(), 1);
}

#[test]
fn cache_store_failures_do_not_fail_requests() {
    let transport = Arc::new(ScriptedTransport::responding(200, AGGREGATION_BODY));
    let client = client_with(
        transport.clone(),
        Arc::new(FailingCache),
        Arc::new(RecordingSink::default()),
    );

    let first = client.execute(42, &aggregation_request()).unwrap();
    let second = client.execute(42, &aggregation_request()).unwrap();

    assert_eq!(first.aggregations(), second.aggregations());
    assert_eq!(transport.calls(), 2);
}
