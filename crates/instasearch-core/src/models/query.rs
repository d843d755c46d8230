use serde::Serialize;

/// Shape of the host's listing query as seen by the interceptor.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryContext {
    pub admin: bool,
    pub main_query: bool,
    pub search: bool,
    pub search_terms: Option<String>,
    pub found_posts: u64,
    pub max_num_pages: u64,
}

impl QueryContext {
    /// Front-end main query for the site search listing.
    pub fn site_search(terms: impl Into<String>) -> Self {
        Self {
            main_query: true,
            search: true,
            search_terms: Some(terms.into()),
            ..Self::default()
        }
    }

    /// Front-end main query that is not a search (archives, single posts, ...).
    pub fn listing() -> Self {
        Self {
            main_query: true,
            ..Self::default()
        }
    }

    pub fn in_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn secondary(mut self) -> Self {
        self.main_query = false;
        self
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Post {
    #[serde(rename = "ID")]
    pub id: u64,
    pub post_author: u64,
    pub post_date: String,
    pub post_date_gmt: String,
    pub post_title: String,
    pub post_content: String,
    pub post_status: String,
    pub comment_status: String,
    pub ping_status: String,
    pub post_name: String,
    pub post_type: String,
    pub filter: String,
}
