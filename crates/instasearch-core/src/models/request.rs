use serde::Serialize;
use serde_json::{Map, Value};

/// Parameters sent to the remote `/sites/{blog_id}/search` endpoint.
///
/// Only aggregation-only requests can be built: `size` and `from` are
/// always zero so no document hits travel back.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SearchRequest {
    aggregations: Map<String, Value>,
    size: u32,
    from: u32,
}

impl SearchRequest {
    pub fn aggregations_only(aggregations: Map<String, Value>) -> Self {
        Self {
            aggregations,
            size: 0,
            from: 0,
        }
    }

    pub fn aggregations(&self) -> &Map<String, Value> {
        &self.aggregations
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u32 {
        self.from
    }

    pub fn to_value(&self) -> Value {
        let mut envelope = Map::new();
        envelope.insert(
            "aggregations".to_string(),
            Value::Object(self.aggregations.clone()),
        );
        envelope.insert("size".to_string(), Value::from(self.size));
        envelope.insert("from".to_string(), Value::from(self.from));
        Value::Object(envelope)
    }
}
