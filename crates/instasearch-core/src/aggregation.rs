use serde_json::{Map, Value, json};

use crate::filters::{FilterKind, FilterSet, WidgetFilter};
use crate::models::SearchRequest;

pub const MAX_AGGREGATION_BUCKETS: u32 = 100;

const DEFAULT_MIN_DOC_COUNT: u32 = 1;

/// Builds the aggregation specification for the configured filters. Each
/// filter id becomes one top-level aggregation name.
pub fn build_aggregation_spec(filters: &FilterSet) -> Map<String, Value> {
    filters
        .iter()
        .map(|(filter_id, filter)| (filter_id.to_string(), aggregation_for(filter)))
        .collect()
}

pub fn build_search_request(filters: &FilterSet) -> SearchRequest {
    SearchRequest::aggregations_only(build_aggregation_spec(filters))
}

fn aggregation_for(filter: &WidgetFilter) -> Value {
    let size = filter.count.min(MAX_AGGREGATION_BUCKETS);

    match &filter.kind {
        FilterKind::Taxonomy { taxonomy } => json!({
            "terms": {
                "field": taxonomy_field(taxonomy),
                "size": size,
            }
        }),
        FilterKind::PostType => json!({
            "terms": {
                "field": "post_type",
                "size": size,
            }
        }),
        FilterKind::DateHistogram {
            field,
            interval,
            min_doc_count,
        } => json!({
            "date_histogram": {
                "interval": interval,
                "field": date_field(field),
                "min_doc_count": min_doc_count.unwrap_or(DEFAULT_MIN_DOC_COUNT),
            }
        }),
    }
}

fn taxonomy_field(taxonomy: &str) -> String {
    match taxonomy {
        "category" => "category.slug_slash_name".to_string(),
        "post_tag" => "tag.slug_slash_name".to_string(),
        other => format!("taxonomy.{other}.slug_slash_name"),
    }
}

fn date_field(field: &str) -> &'static str {
    match field {
        "post_date_gmt" => "date_gmt",
        "post_modified" => "modified",
        "post_modified_gmt" => "modified_gmt",
        _ => "date",
    }
}
