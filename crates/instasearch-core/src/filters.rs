use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

const DEFAULT_FILTER_COUNT: u32 = 5;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FilterKind {
    Taxonomy {
        taxonomy: String,
    },
    PostType,
    DateHistogram {
        field: String,
        interval: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_doc_count: Option<u32>,
    },
}

impl FilterKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Taxonomy { .. } => "taxonomy",
            Self::PostType => "post_type",
            Self::DateHistogram { .. } => "date_histogram",
        }
    }
}

/// A filter as configured inside a search widget instance.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FilterDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_filter_count")]
    pub count: u32,
    #[serde(flatten)]
    pub kind: FilterKind,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct SearchWidget {
    pub id: String,
    #[serde(default)]
    pub post_types: Vec<String>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub filters: Vec<FilterDefinition>,
}

/// A filter tagged with the widget it came from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WidgetFilter {
    pub widget_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_filter_count")]
    pub count: u32,
    #[serde(flatten)]
    pub kind: FilterKind,
}

/// Ordered mapping of filter id to filter. Iteration order is insertion order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    filters: IndexMap<String, WidgetFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens widget filters into one set, assigning ids `{type}_{n}` from a
    /// counter shared across all widgets.
    pub fn from_widgets<'a>(widgets: impl IntoIterator<Item = &'a SearchWidget>) -> Self {
        let mut set = Self::new();
        let mut position = 0usize;

        for widget in widgets {
            for definition in &widget.filters {
                let filter_id = format!("{}_{position}", definition.kind.type_name());
                position += 1;
                set.insert(
                    filter_id,
                    WidgetFilter {
                        widget_id: widget.id.clone(),
                        name: definition.name.clone(),
                        count: definition.count,
                        kind: definition.kind.clone(),
                    },
                );
            }
        }

        set
    }

    pub fn insert(&mut self, filter_id: impl Into<String>, filter: WidgetFilter) {
        self.filters.insert(filter_id.into(), filter);
    }

    pub fn get(&self, filter_id: &str) -> Option<&WidgetFilter> {
        self.filters.get(filter_id)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WidgetFilter)> {
        self.filters
            .iter()
            .map(|(filter_id, filter)| (filter_id.as_str(), filter))
    }
}

impl FromIterator<(String, WidgetFilter)> for FilterSet {
    fn from_iter<I: IntoIterator<Item = (String, WidgetFilter)>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct GroupedFilter {
    pub filter_id: String,
    #[serde(flatten)]
    pub filter: WidgetFilter,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct WidgetGroup {
    pub widget_id: String,
    pub filters: Vec<GroupedFilter>,
}

/// Groups filters by `widget_id`. Groups appear in first-seen order and keep
/// the source order of their filters.
pub fn group_by_widget(filters: &FilterSet) -> Vec<WidgetGroup> {
    let mut groups: IndexMap<&str, WidgetGroup> = IndexMap::new();

    for (filter_id, filter) in filters.iter() {
        groups
            .entry(filter.widget_id.as_str())
            .or_insert_with(|| WidgetGroup {
                widget_id: filter.widget_id.clone(),
                filters: Vec::new(),
            })
            .filters
            .push(GroupedFilter {
                filter_id: filter_id.to_string(),
                filter: filter.clone(),
            });
    }

    groups.into_values().collect()
}

fn default_filter_count() -> u32 {
    DEFAULT_FILTER_COUNT
}
