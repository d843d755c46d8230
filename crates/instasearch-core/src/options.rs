use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::filters::{FilterSet, SearchWidget, WidgetGroup, group_by_widget};

pub const DEFAULT_API_BASE: &str = "https://public-api.wordpress.com/rest/v1.3";
pub const DEFAULT_USER_AGENT: &str = "jetpack_search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteSearchConfig {
    pub api_base: String,
    pub timeout_secs: u64,
    pub user_agent: String,
    pub cache_ttl_secs: u64,
}

impl Default for RemoteSearchConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl RemoteSearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn search_endpoint(&self, blog_id: u64) -> String {
        format!("{}/sites/{blog_id}/search", self.api_base.trim_end_matches('/'))
    }
}

/// Display options for the search overlay.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayOptions {
    pub close_color: String,
    pub color_theme: String,
    pub enable_inf_scroll: bool,
    pub highlight_color: String,
    pub opacity: u8,
    pub show_logo: bool,
    pub show_powered_by: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            close_color: "#BD3854".to_string(),
            color_theme: "light".to_string(),
            enable_inf_scroll: true,
            highlight_color: "#FFC".to_string(),
            opacity: 97,
            show_logo: true,
            show_powered_by: true,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PostTypeLabels {
    pub singular_name: String,
    pub name: String,
}

/// Every option the component reads, resolved up front.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstantSearchConfig {
    pub site_id: u64,
    pub home_url: String,
    pub locale: String,
    pub posts_per_page: u32,
    /// Offset of the site's local time from UTC, used for placeholder dates.
    pub utc_offset_minutes: i32,
    pub overlay: OverlayOptions,
    pub post_types: IndexMap<String, PostTypeLabels>,
    pub remote: RemoteSearchConfig,
    pub widgets: Vec<SearchWidget>,
}

impl Default for InstantSearchConfig {
    fn default() -> Self {
        Self {
            site_id: 0,
            home_url: String::new(),
            locale: "en_US".to_string(),
            posts_per_page: 10,
            utc_offset_minutes: 0,
            overlay: OverlayOptions::default(),
            post_types: IndexMap::new(),
            remote: RemoteSearchConfig::default(),
            widgets: Vec::new(),
        }
    }
}

/// Options object handed to the front-end search application.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientOptions {
    pub close_color: String,
    pub color_theme: String,
    pub enable_inf_scroll: bool,
    pub highlight_color: String,
    pub opacity: u8,
    pub show_logo: bool,
    pub show_powered_by: bool,
    pub home_url: String,
    pub locale: String,
    pub posts_per_page: u32,
    pub site_id: u64,
    pub post_type_filters: Vec<String>,
    pub post_types: IndexMap<String, PostTypeLabels>,
    pub sort: Option<String>,
    pub widgets: Vec<WidgetGroup>,
}

impl ClientOptions {
    /// Post type restrictions and sort order come from the last configured
    /// widget instance.
    pub fn from_config(config: &InstantSearchConfig, filters: &FilterSet) -> Self {
        let last_widget = config.widgets.last();
        let overlay = &config.overlay;

        Self {
            close_color: overlay.close_color.clone(),
            color_theme: overlay.color_theme.clone(),
            enable_inf_scroll: overlay.enable_inf_scroll,
            highlight_color: overlay.highlight_color.clone(),
            opacity: overlay.opacity,
            show_logo: overlay.show_logo,
            show_powered_by: overlay.show_powered_by,
            home_url: config.home_url.clone(),
            locale: config.locale.replace('_', "-"),
            posts_per_page: config.posts_per_page,
            site_id: config.site_id,
            post_type_filters: last_widget
                .map(|widget| widget.post_types.clone())
                .unwrap_or_default(),
            post_types: config.post_types.clone(),
            sort: last_widget.and_then(|widget| widget.sort.clone()),
            widgets: group_by_widget(filters),
        }
    }
}
