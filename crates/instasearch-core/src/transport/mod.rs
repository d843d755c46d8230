pub mod ureq_transport;

pub use ureq_transport::UreqTransport;

use std::time::Duration;

use serde_json::Value;

use crate::models::SearchError;

pub type TransportResult<T> = Result<T, SearchError>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpGetRequest {
    pub url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

/// A completed HTTP exchange. Non-2xx statuses are still `Ok` at this layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

pub trait SearchTransport: Send + Sync {
    /// Performs one GET. Connection failures and timeouts are errors of kind
    /// `Transport`; any received status is returned as a response.
    fn get(&self, request: &HttpGetRequest) -> TransportResult<HttpResponse>;
}

/// Flattens request parameters into a query string. Nested objects use
/// bracket notation (`a[b][c]=v`), arrays use numeric indices, booleans become
/// `1`/`0` and nulls are skipped.
pub fn encode_query(params: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            flatten_param(&urlencoding::encode(key), value, &mut pairs);
        }
    }
    pairs.join("&")
}

fn flatten_param(prefix: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => pairs.push(format!("{prefix}={}", u8::from(*flag))),
        Value::Number(number) => pairs.push(format!("{prefix}={number}")),
        Value::String(text) => pairs.push(format!("{prefix}={}", urlencoding::encode(text))),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_param(&format!("{prefix}[{index}]"), item, pairs);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                flatten_param(
                    &format!("{prefix}[{}]", urlencoding::encode(key)),
                    item,
                    pairs,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::encode_query;

    #[test]
    fn nested_objects_use_bracket_notation() {
        let query = encode_query(&json!({
            "aggregations": {"post_type_0": {"terms": {"field": "post_type", "size": 5}}},
        }));

        let mut pairs: Vec<_> = query.split('&').collect();
        pairs.sort_unstable();
        assert_eq!(
            pairs,
            [
                "aggregations[post_type_0][terms][field]=post_type",
                "aggregations[post_type_0][terms][size]=5",
            ]
        );
    }

    #[test]
    fn scalars_are_encoded() {
        let query = encode_query(&json!({
            "q": "cats & dogs",
            "flag": true,
            "off": false,
            "missing": null,
            "list": ["a", "b"],
        }));

        let mut pairs: Vec<_> = query.split('&').collect();
        pairs.sort_unstable();
        assert_eq!(
            pairs,
            ["flag=1", "list[0]=a", "list[1]=b", "off=0", "q=cats%20%26%20dogs"]
        );
    }

    #[test]
    fn empty_containers_produce_no_pairs() {
        assert_eq!(encode_query(&json!({"aggregations": {}, "tags": []})), "");
        assert_eq!(encode_query(&json!("not-an-object")), "");
    }
}
