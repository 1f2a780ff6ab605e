//! Query shaping: the declarative filter/search/order/paginate pipeline
//! applied by both services to their list endpoints.
//!
//! The shaper is stateless and deterministic: identical inputs always produce
//! the identical page, with ties broken by record id ascending.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use threadline_database::{CoreError, CoreResult};

/// Fields a record set declares for shaping. Filter and search keys outside
/// the declared sets are ignored, not errored.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Fields accepting equality filters, plus `<field>_after` /
    /// `<field>_before` range keys
    pub filterable: &'static [&'static str],
    /// Fields included in free-text search, OR-combined
    pub searchable: &'static [&'static str],
    /// Fields accepted as ordering keys
    pub orderable: &'static [&'static str],
    /// Ordering field used when the request names none. Descending by default.
    pub default_order: &'static str,
}

/// A record the shaper can filter, search, and order.
///
/// `field` returns the comparable value for a declared field; RFC3339
/// timestamps compare correctly as strings.
pub trait Shapeable {
    fn record_id(&self) -> &str;
    fn field(&self, name: &str) -> Option<String>;
}

/// Listing parameters supplied by the external dispatch collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListParams {
    /// 1-based page number
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Filter key-value pairs; unknown keys are ignored
    #[serde(default)]
    pub filters: HashMap<String, String>,
    /// Free-text search across the declared search fields
    pub search: Option<String>,
    pub order_by: Option<String>,
    /// Defaults to true (newest first)
    pub descending: Option<bool>,
}

/// Page-size bounds, taken from the service configuration.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_size: 20,
            max_size: 100,
        }
    }
}

/// A page of results with total count and next/previous markers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub next_page: Option<u32>,
    pub previous_page: Option<u32>,
}

/// Apply filters, search, ordering, and pagination to a record set.
pub fn shape<T: Shapeable>(
    items: Vec<T>,
    schema: &FieldSchema,
    params: &ListParams,
    limits: &PageLimits,
) -> CoreResult<Page<T>> {
    let page = params.page.unwrap_or(1);
    let per_page = params
        .page_size
        .unwrap_or(limits.default_size)
        .min(limits.max_size);

    if page == 0 {
        return Err(CoreError::validation("page number must be greater than 0"));
    }
    if per_page == 0 {
        return Err(CoreError::validation("page size must be greater than 0"));
    }

    let mut items = items;

    for (key, value) in &params.filters {
        if schema.filterable.contains(&key.as_str()) {
            items.retain(|item| item.field(key).as_deref() == Some(value.as_str()));
        } else if let Some(base) = key.strip_suffix("_after") {
            if schema.filterable.contains(&base) {
                items.retain(|item| matches!(item.field(base), Some(v) if v.as_str() >= value.as_str()));
            }
        } else if let Some(base) = key.strip_suffix("_before") {
            if schema.filterable.contains(&base) {
                items.retain(|item| matches!(item.field(base), Some(v) if v.as_str() < value.as_str()));
            }
        }
        // Unknown filter keys are ignored
    }

    if let Some(search) = params.search.as_deref() {
        let needle = search.to_lowercase();
        if !needle.is_empty() {
            items.retain(|item| {
                schema.searchable.iter().any(|field| {
                    item.field(field)
                        .map(|value| value.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            });
        }
    }

    let order_field = match params.order_by.as_deref() {
        Some(requested) if schema.orderable.contains(&requested) => requested,
        _ => schema.default_order,
    };
    let descending = params.descending.unwrap_or(true);

    items.sort_by(|a, b| {
        let a_value = a.field(order_field).unwrap_or_default();
        let b_value = b.field(order_field).unwrap_or_default();
        let primary = if descending {
            b_value.cmp(&a_value)
        } else {
            a_value.cmp(&b_value)
        };
        primary.then_with(|| a.record_id().cmp(b.record_id()))
    });

    let total_items = items.len() as u64;
    let total_pages = ((total_items as f64) / (per_page as f64)).ceil() as u32;

    let offset = (page as usize - 1) * per_page as usize;
    let page_items: Vec<T> = items
        .into_iter()
        .skip(offset)
        .take(per_page as usize)
        .collect();

    Ok(Page {
        items: page_items,
        page,
        per_page,
        total_items,
        total_pages,
        next_page: (page < total_pages).then(|| page + 1),
        previous_page: (page > 1).then(|| page - 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Note {
        id: String,
        author: String,
        text: String,
        created_at: String,
    }

    impl Shapeable for Note {
        fn record_id(&self) -> &str {
            &self.id
        }

        fn field(&self, name: &str) -> Option<String> {
            match name {
                "author" => Some(self.author.clone()),
                "text" => Some(self.text.clone()),
                "created_at" => Some(self.created_at.clone()),
                _ => None,
            }
        }
    }

    const SCHEMA: FieldSchema = FieldSchema {
        filterable: &["author", "created_at"],
        searchable: &["text"],
        orderable: &["created_at"],
        default_order: "created_at",
    };

    fn note(id: &str, author: &str, text: &str, created_at: &str) -> Note {
        Note {
            id: id.to_string(),
            author: author.to_string(),
            text: text.to_string(),
            created_at: created_at.to_string(),
        }
    }

    fn sample_notes() -> Vec<Note> {
        vec![
            note("n1", "ada", "first note", "2024-01-01T00:00:00Z"),
            note("n2", "bob", "second NOTE", "2024-01-02T00:00:00Z"),
            note("n3", "ada", "unrelated", "2024-01-03T00:00:00Z"),
        ]
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let page = shape(sample_notes(), &SCHEMA, &ListParams::default(), &PageLimits::default())
            .unwrap();

        let ids: Vec<&str> = page.items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn test_equality_filter_on_declared_field() {
        let params = ListParams {
            filters: HashMap::from([("author".to_string(), "ada".to_string())]),
            ..Default::default()
        };

        let page = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(page.total_items, 2);
        assert!(page.items.iter().all(|n| n.author == "ada"));
    }

    #[test]
    fn test_unknown_filter_keys_are_ignored() {
        let params = ListParams {
            filters: HashMap::from([("color".to_string(), "blue".to_string())]),
            ..Default::default()
        };

        let page = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(page.total_items, 3);
    }

    #[test]
    fn test_range_filters() {
        let params = ListParams {
            filters: HashMap::from([
                ("created_at_after".to_string(), "2024-01-02T00:00:00Z".to_string()),
                ("created_at_before".to_string(), "2024-01-03T00:00:00Z".to_string()),
            ]),
            ..Default::default()
        };

        let page = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(page.total_items, 1);
        assert_eq!(page.items[0].id, "n2");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let params = ListParams {
            search: Some("note".to_string()),
            ..Default::default()
        };

        let page = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(page.total_items, 2);
    }

    #[test]
    fn test_tie_break_by_record_id_ascending() {
        let notes = vec![
            note("b", "ada", "x", "2024-01-01T00:00:00Z"),
            note("a", "ada", "y", "2024-01-01T00:00:00Z"),
        ];

        let page = shape(notes, &SCHEMA, &ListParams::default(), &PageLimits::default()).unwrap();
        let ids: Vec<&str> = page.items.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_pagination_markers() {
        let params = ListParams {
            page: Some(2),
            page_size: Some(1),
            ..Default::default()
        };

        let page = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.total_items, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.next_page, Some(3));
        assert_eq!(page.previous_page, Some(1));
    }

    #[test]
    fn test_page_size_is_clamped_to_max() {
        let params = ListParams {
            page_size: Some(500),
            ..Default::default()
        };

        let page = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(page.per_page, 100);
    }

    #[test]
    fn test_zero_page_and_size_rejected() {
        let params = ListParams {
            page: Some(0),
            ..Default::default()
        };
        assert!(shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).is_err());

        let params = ListParams {
            page_size: Some(0),
            ..Default::default()
        };
        assert!(shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).is_err());
    }

    #[test]
    fn test_shaping_is_deterministic() {
        let params = ListParams {
            search: Some("note".to_string()),
            page_size: Some(10),
            ..Default::default()
        };

        let first = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        let second = shape(sample_notes(), &SCHEMA, &params, &PageLimits::default()).unwrap();
        assert_eq!(first.items, second.items);
    }

    #[test]
    fn test_params_deserialize_from_query_payload() {
        let params: ListParams = serde_json::from_value(serde_json::json!({
            "page": 1,
            "page_size": 10,
            "filters": {"author": "ada"},
            "search": "note",
            "order_by": "created_at",
            "descending": false
        }))
        .unwrap();

        assert_eq!(params.page, Some(1));
        assert_eq!(params.filters.get("author").unwrap(), "ada");
        assert_eq!(params.descending, Some(false));
    }
}
