use serde_json::{Map, Value};

/// Diagnostics for a response that came over the network.
#[derive(Clone, Debug, PartialEq)]
pub struct RoundTrip {
    pub response_code: u16,
    pub elapsed_ms: f64,
    pub es_time: Option<f64>,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchResponse {
    body: Value,
    round_trip: Option<RoundTrip>,
}

impl SearchResponse {
    pub fn fetched(body: Value, round_trip: RoundTrip) -> Self {
        Self {
            body,
            round_trip: Some(round_trip),
        }
    }

    pub fn cached(body: Value) -> Self {
        Self {
            body,
            round_trip: None,
        }
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// `None` when the response was served from cache.
    pub fn round_trip(&self) -> Option<&RoundTrip> {
        self.round_trip.as_ref()
    }

    pub fn is_cached(&self) -> bool {
        self.round_trip.is_none()
    }

    pub fn aggregations(&self) -> Option<&Map<String, Value>> {
        self.body.get("aggregations").and_then(Value::as_object)
    }

    pub fn took(&self) -> Option<f64> {
        took_ms(&self.body)
    }
}

/// Server-reported timing. Zero is treated as absent.
pub fn took_ms(body: &Value) -> Option<f64> {
    body.get("took")
        .and_then(Value::as_f64)
        .filter(|took| *took != 0.0)
}
