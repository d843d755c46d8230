use serde_json::{Map, Value};
use time::{OffsetDateTime, UtcOffset};

use crate::aggregation::build_search_request;
use crate::client::{ClientResult, RemoteSearchClient};
use crate::filters::FilterSet;
use crate::models::{Post, QueryContext, SearchResponse};
use crate::options::{ClientOptions, InstantSearchConfig};

const PLACEHOLDER_TITLE: &str = "Some title or other";
const PLACEHOLDER_CONTENT: &str = "Whatever you want here. Maybe some cat pictures....";

/// Long-lived search component shared by all requests. Holds the resolved
/// configuration, the derived filters and the remote client.
pub struct InstantSearch {
    config: InstantSearchConfig,
    filters: FilterSet,
    client: RemoteSearchClient,
}

impl InstantSearch {
    pub fn new(config: InstantSearchConfig, client: RemoteSearchClient) -> Self {
        let filters = FilterSet::from_widgets(&config.widgets);
        Self {
            config,
            filters,
            client,
        }
    }

    pub fn with_filters(mut self, filters: FilterSet) -> Self {
        self.filters = filters;
        self
    }

    pub fn config(&self) -> &InstantSearchConfig {
        &self.config
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn client(&self) -> &RemoteSearchClient {
        &self.client
    }

    pub fn client_options(&self) -> ClientOptions {
        ClientOptions::from_config(&self.config, &self.filters)
    }

    /// Opens the state for one host request.
    pub fn scope(&self) -> SearchScope<'_> {
        SearchScope {
            search: self,
            outcome: None,
        }
    }
}

/// Per-request pipeline: `before_listing` replaces the listing, `after_parse`
/// fetches aggregations once, `aggregation_results` reads them back.
pub struct SearchScope<'a> {
    search: &'a InstantSearch,
    outcome: Option<ClientResult<SearchResponse>>,
}

impl SearchScope<'_> {
    pub fn before_listing(&self, posts: Vec<Post>, query: &mut QueryContext) -> Vec<Post> {
        if !should_intercept(query) {
            return posts;
        }
        intercept_listing(query, self.search.config.utc_offset_minutes)
    }

    pub fn after_parse(&mut self, query: &QueryContext) {
        if self.outcome.is_some() || query.admin || self.search.filters.is_empty() {
            return;
        }

        let request = build_search_request(&self.search.filters);
        let outcome = self.search.client.execute(self.search.config.site_id, &request);

        if let Err(error) = &outcome {
            tracing::warn!(
                site_id = self.search.config.site_id,
                code = error.code(),
                message = %error.message,
                "aggregation query failed; rendering without filter counts"
            );
        }

        self.outcome = Some(outcome);
    }

    pub fn outcome(&self) -> Option<&ClientResult<SearchResponse>> {
        self.outcome.as_ref()
    }

    /// Aggregations of the last fetched response, or an empty map when
    /// nothing was fetched, the fetch failed, or the response had none.
    pub fn aggregation_results(&self) -> Map<String, Value> {
        match &self.outcome {
            Some(Ok(response)) => response.aggregations().cloned().unwrap_or_default(),
            _ => Map::new(),
        }
    }
}

pub fn should_intercept(query: &QueryContext) -> bool {
    !query.admin && query.main_query && query.search
}

/// Replaces the listing with a single placeholder post and reports one page
/// with one result.
pub fn intercept_listing(query: &mut QueryContext, utc_offset_minutes: i32) -> Vec<Post> {
    query.found_posts = 1;
    query.max_num_pages = 1;
    vec![placeholder_post(OffsetDateTime::now_utc(), utc_offset_minutes)]
}

pub fn placeholder_post(now_utc: OffsetDateTime, utc_offset_minutes: i32) -> Post {
    let offset = UtcOffset::from_whole_seconds(utc_offset_minutes.saturating_mul(60))
        .unwrap_or_else(|error| {
            tracing::warn!(utc_offset_minutes, %error, "invalid site UTC offset; using UTC");
            UtcOffset::UTC
        });
    let now_utc = now_utc.to_offset(UtcOffset::UTC);

    Post {
        id: 1,
        post_author: 1,
        post_date: mysql_datetime(now_utc.to_offset(offset)),
        post_date_gmt: mysql_datetime(now_utc),
        post_title: PLACEHOLDER_TITLE.to_string(),
        post_content: PLACEHOLDER_CONTENT.to_string(),
        post_status: "publish".to_string(),
        comment_status: "closed".to_string(),
        ping_status: "closed".to_string(),
        post_name: "fake-page".to_string(),
        post_type: "page".to_string(),
        filter: "raw".to_string(),
    }
}

fn mysql_datetime(value: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}:{:02}",
        value.year(),
        u8::from(value.month()),
        value.day(),
        value.hour(),
        value.minute(),
        value.second()
    )
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::{placeholder_post, should_intercept};
    use crate::models::QueryContext;

    #[test]
    fn intercepts_only_front_end_main_search() {
        assert!(should_intercept(&QueryContext::site_search("cats")));
        assert!(!should_intercept(&QueryContext::site_search("cats").in_admin()));
        assert!(!should_intercept(&QueryContext::site_search("cats").secondary()));
        assert!(!should_intercept(&QueryContext::listing()));
    }

    #[test]
    fn placeholder_has_fixed_identity_and_local_dates() {
        let post = placeholder_post(datetime!(2024-03-01 23:30:05 UTC), 120);

        assert_eq!(post.id, 1);
        assert_eq!(post.post_author, 1);
        assert_eq!(post.post_title, "Some title or other");
        assert_eq!(post.post_name, "fake-page");
        assert_eq!(post.post_type, "page");
        assert_eq!(post.post_status, "publish");
        assert_eq!(post.post_date_gmt, "2024-03-01 23:30:05");
        assert_eq!(post.post_date, "2024-03-02 01:30:05");
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        let post = placeholder_post(datetime!(2024-03-01 10:00:00 UTC), 60 * 48);
        assert_eq!(post.post_date, post.post_date_gmt);
    }
}
