use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;

use crate::cache::{SearchCacheStore, fingerprint};
use crate::events::{
    CompletedSearchQuery, FailedSearchQuery, SearchEventSink, TracingEventSink,
};
use crate::models::response::took_ms;
use crate::models::{RoundTrip, SearchError, SearchErrorKind, SearchRequest, SearchResponse};
use crate::options::RemoteSearchConfig;
use crate::transport::{HttpGetRequest, SearchTransport, encode_query};

pub type ClientResult<T> = Result<T, SearchError>;

/// Executes search requests against the remote API, memoizing successful
/// raw responses by request fingerprint.
#[derive(Clone)]
pub struct RemoteSearchClient {
    config: RemoteSearchConfig,
    transport: Arc<dyn SearchTransport>,
    cache: Arc<dyn SearchCacheStore>,
    events: Arc<dyn SearchEventSink>,
}

impl RemoteSearchClient {
    pub fn new(
        config: RemoteSearchConfig,
        transport: Arc<dyn SearchTransport>,
        cache: Arc<dyn SearchCacheStore>,
    ) -> Self {
        Self {
            config,
            transport,
            cache,
            events: Arc::new(TracingEventSink),
        }
    }

    pub fn with_event_sink(mut self, events: Arc<dyn SearchEventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn config(&self) -> &RemoteSearchConfig {
        &self.config
    }

    pub fn search_url(&self, blog_id: u64, args: &Value) -> String {
        let endpoint = self.config.search_endpoint(blog_id);
        let query = encode_query(args);
        if query.is_empty() {
            endpoint
        } else {
            format!("{endpoint}?{query}")
        }
    }

    pub fn execute(&self, blog_id: u64, request: &SearchRequest) -> ClientResult<SearchResponse> {
        let args = request.to_value();
        let cache_key = fingerprint(&args);

        if let Some(cached) = self.cached_response(&cache_key) {
            tracing::debug!(blog_id, fingerprint = %cache_key, "search cache hit");
            return Ok(SearchResponse::cached(cached));
        }
        tracing::debug!(blog_id, fingerprint = %cache_key, "search cache miss");

        let url = self.search_url(blog_id, &args);
        let http_request = HttpGetRequest {
            url: url.clone(),
            timeout: self.config.timeout(),
            user_agent: self.config.user_agent.clone(),
        };

        let started = Instant::now();
        let outcome = self.transport.get(&http_request);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                tracing::error!(
                    blog_id,
                    elapsed_ms,
                    kind = ?error.kind,
                    message = %error.message,
                    "search request failed"
                );
                return Err(error);
            }
        };

        let response_code = response.status;
        let parsed = serde_json::from_str::<Value>(&response.body).ok();

        if !(200..300).contains(&response_code) {
            self.events.search_query_failed(&FailedSearchQuery {
                response_code,
                json: parsed.unwrap_or(Value::Null),
            });
            return Err(SearchError::invalid_response(response_code));
        }

        let Some(body) = parsed else {
            self.events.search_query_failed(&FailedSearchQuery {
                response_code,
                json: Value::Null,
            });
            return Err(SearchError::new(
                SearchErrorKind::ParseFailure,
                format!("search API returned status {response_code} with a non-JSON body"),
            ));
        };

        let es_time = took_ms(&body);
        self.events.search_query_completed(&CompletedSearchQuery {
            args,
            response: body.clone(),
            response_code,
            elapsed_time: elapsed_ms,
            es_time,
            url: url.clone(),
        });

        if let Err(error) = self.cache.set(&cache_key, &body, self.config.cache_ttl()) {
            tracing::warn!(
                fingerprint = %cache_key,
                kind = ?error.kind,
                message = %error.message,
                "failed to store search response in cache"
            );
        }

        Ok(SearchResponse::fetched(
            body,
            RoundTrip {
                response_code,
                elapsed_ms,
                es_time,
                url,
            },
        ))
    }

    fn cached_response(&self, cache_key: &str) -> Option<Value> {
        match self.cache.get(cache_key) {
            Ok(cached) => cached,
            Err(error) => {
                tracing::warn!(
                    fingerprint = %cache_key,
                    kind = ?error.kind,
                    message = %error.message,
                    "failed to read search cache; treating as miss"
                );
                None
            }
        }
    }
}
