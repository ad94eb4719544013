pub mod values;

pub use values::{ComparableValue, PropertyAccessor};

use std::cmp::Ordering;

/// Well-known property names shared by every resource kind.
pub mod property {
    pub const NAME: &str = "name";
    pub const NAMESPACE: &str = "namespace";
    pub const CREATION_TIMESTAMP: &str = "creationTimestamp";
    pub const STATUS: &str = "status";
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyFilter {
    pub property: String,
    pub pattern: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub property: String,
    pub ascending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page_size: usize,
    /// 1-based page number.
    pub page: usize,
}

/// One request's filter, sort and pagination settings. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceQuery {
    pub filters: Vec<PropertyFilter>,
    pub sort_by: Vec<SortKey>,
    pub pagination: Option<Pagination>,
}

impl ResourceQuery {
    /// Builds a query from the raw request parameters the surrounding web
    /// layer extracts: `sort_by` as direction/property pairs
    /// ("d,creationTimestamp,a,name"), `filter_by` as property/pattern pairs
    /// ("name,web"), and optional pagination. Trailing unpaired tokens are
    /// ignored.
    pub fn from_params(
        sort_by: &str,
        filter_by: &str,
        page: Option<usize>,
        items_per_page: Option<usize>,
    ) -> Self {
        let sort_by = parse_pairs(sort_by)
            .into_iter()
            .map(|(direction, prop)| SortKey {
                property: prop.to_string(),
                ascending: direction != "d",
            })
            .collect();

        let filters = parse_pairs(filter_by)
            .into_iter()
            .map(|(prop, pattern)| PropertyFilter {
                property: prop.to_string(),
                pattern: pattern.to_string(),
            })
            .collect();

        let pagination = match (page, items_per_page) {
            (Some(page), Some(page_size)) if page_size > 0 => Some(Pagination { page_size, page }),
            _ => None,
        };

        ResourceQuery {
            filters,
            sort_by,
            pagination,
        }
    }
}

fn parse_pairs(raw: &str) -> Vec<(&str, &str)> {
    let tokens: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    tokens
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect()
}

/// Applies a query to a homogeneous list of property-bearing cells.
///
/// Filter terms are ANDed; the multi-key sort is stable, so ties keep their
/// pre-sort relative order; `total` counts the filtered set before
/// pagination, and a page past the end is empty rather than an error.
pub fn run_query<T: PropertyAccessor>(cells: Vec<T>, query: &ResourceQuery) -> (Vec<T>, usize) {
    let mut filtered: Vec<T> = cells
        .into_iter()
        .filter(|cell| matches_filters(cell, &query.filters))
        .collect();
    let total = filtered.len();

    if !query.sort_by.is_empty() {
        filtered.sort_by(|a, b| compare_cells(a, b, &query.sort_by));
    }

    let page = match query.pagination {
        Some(p) => paginate(filtered, p),
        None => filtered,
    };

    (page, total)
}

fn matches_filters<T: PropertyAccessor>(cell: &T, filters: &[PropertyFilter]) -> bool {
    filters.iter().all(|f| {
        cell.property(&f.property)
            .map(|value| value.contains(&f.pattern))
            .unwrap_or(false)
    })
}

fn compare_cells<T: PropertyAccessor>(a: &T, b: &T, keys: &[SortKey]) -> Ordering {
    for key in keys {
        let ord = match (a.property(&key.property), b.property(&key.property)) {
            (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
            _ => Ordering::Equal,
        };
        let ord = if key.ascending { ord } else { ord.reverse() };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn paginate<T>(items: Vec<T>, p: Pagination) -> Vec<T> {
    let start = p.page.saturating_sub(1).saturating_mul(p.page_size);
    if p.page == 0 || start >= items.len() {
        return Vec::new();
    }
    items
        .into_iter()
        .skip(start)
        .take(p.page_size)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestCell {
        name: &'static str,
        weight: i64,
    }

    impl PropertyAccessor for TestCell {
        fn property(&self, name: &str) -> Option<ComparableValue> {
            match name {
                "name" => Some(ComparableValue::str(self.name)),
                "weight" => Some(ComparableValue::Quantity(self.weight)),
                _ => None,
            }
        }
    }

    fn cells() -> Vec<TestCell> {
        vec![
            TestCell { name: "web-1", weight: 3 },
            TestCell { name: "db-0", weight: 1 },
            TestCell { name: "web-2", weight: 3 },
            TestCell { name: "cache", weight: 2 },
        ]
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let (page, total) = run_query(cells(), &ResourceQuery::default());
        assert_eq!(total, 4);
        assert_eq!(page.len(), 4);
    }

    #[test]
    fn test_filters_are_anded() {
        let query = ResourceQuery {
            filters: vec![
                PropertyFilter {
                    property: "name".to_string(),
                    pattern: "web".to_string(),
                },
                PropertyFilter {
                    property: "weight".to_string(),
                    pattern: "3".to_string(),
                },
            ],
            ..Default::default()
        };
        let (page, total) = run_query(cells(), &query);
        assert_eq!(total, 2);
        assert!(page.iter().all(|c| c.name.starts_with("web")));
    }

    #[test]
    fn test_no_match_filter_is_empty_not_error() {
        let query = ResourceQuery {
            filters: vec![PropertyFilter {
                property: "name".to_string(),
                pattern: "no-such-pod".to_string(),
            }],
            ..Default::default()
        };
        let (page, total) = run_query(cells(), &query);
        assert_eq!(total, 0);
        assert!(page.is_empty());
    }

    #[test]
    fn test_unknown_filter_property_matches_nothing() {
        let query = ResourceQuery {
            filters: vec![PropertyFilter {
                property: "bogus".to_string(),
                pattern: "x".to_string(),
            }],
            ..Default::default()
        };
        let (_, total) = run_query(cells(), &query);
        assert_eq!(total, 0);
    }

    #[test]
    fn test_unknown_sort_key_leaves_order_unchanged() {
        let query = ResourceQuery {
            sort_by: vec![SortKey {
                property: "bogus".to_string(),
                ascending: true,
            }],
            ..Default::default()
        };
        let (page, _) = run_query(cells(), &query);
        let names: Vec<&str> = page.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["web-1", "db-0", "web-2", "cache"]);
    }

    #[test]
    fn test_multi_key_sort_with_direction() {
        let query = ResourceQuery {
            sort_by: vec![
                SortKey {
                    property: "weight".to_string(),
                    ascending: false,
                },
                SortKey {
                    property: "name".to_string(),
                    ascending: true,
                },
            ],
            ..Default::default()
        };
        let (page, _) = run_query(cells(), &query);
        let names: Vec<&str> = page.iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["web-1", "web-2", "cache", "db-0"]);
    }

    #[test]
    fn test_sort_is_stable_on_equal_keys() {
        let query = ResourceQuery {
            sort_by: vec![SortKey {
                property: "weight".to_string(),
                ascending: false,
            }],
            ..Default::default()
        };
        let (page, _) = run_query(cells(), &query);
        let names: Vec<&str> = page.iter().map(|c| c.name).collect();
        // web-1 and web-2 tie on weight and keep their input order
        assert_eq!(names, vec!["web-1", "web-2", "cache", "db-0"]);
    }

    #[test]
    fn test_pagination_pages_concatenate_to_full_sequence() {
        let base = ResourceQuery {
            sort_by: vec![SortKey {
                property: "name".to_string(),
                ascending: true,
            }],
            ..Default::default()
        };

        let mut collected = Vec::new();
        for page_number in 1..=3 {
            let query = ResourceQuery {
                pagination: Some(Pagination {
                    page_size: 2,
                    page: page_number,
                }),
                ..base.clone()
            };
            let (page, total) = run_query(cells(), &query);
            assert_eq!(total, 4);
            assert!(page.len() <= 2);
            collected.extend(page.into_iter().map(|c| c.name));
        }

        let (full, _) = run_query(cells(), &base);
        let full: Vec<&str> = full.iter().map(|c| c.name).collect();
        assert_eq!(collected, full);
    }

    #[test]
    fn test_page_beyond_end_is_empty() {
        let query = ResourceQuery {
            pagination: Some(Pagination {
                page_size: 10,
                page: 5,
            }),
            ..Default::default()
        };
        let (page, total) = run_query(cells(), &query);
        assert_eq!(total, 4);
        assert!(page.is_empty());
    }

    #[test]
    fn test_from_params_parsing() {
        let query = ResourceQuery::from_params(
            "d,creationTimestamp,a,name",
            "name,web,namespace,prod",
            Some(2),
            Some(25),
        );

        assert_eq!(
            query.sort_by,
            vec![
                SortKey {
                    property: "creationTimestamp".to_string(),
                    ascending: false,
                },
                SortKey {
                    property: "name".to_string(),
                    ascending: true,
                },
            ]
        );
        assert_eq!(
            query.filters,
            vec![
                PropertyFilter {
                    property: "name".to_string(),
                    pattern: "web".to_string(),
                },
                PropertyFilter {
                    property: "namespace".to_string(),
                    pattern: "prod".to_string(),
                },
            ]
        );
        assert_eq!(
            query.pagination,
            Some(Pagination {
                page_size: 25,
                page: 2,
            })
        );
    }

    #[test]
    fn test_from_params_ignores_trailing_and_empty_tokens() {
        let query = ResourceQuery::from_params("a,name,d", " ,, ", None, Some(10));
        assert_eq!(query.sort_by.len(), 1);
        assert!(query.filters.is_empty());
        // pagination needs both page and page size
        assert_eq!(query.pagination, None);
    }

    #[test]
    fn test_zero_page_size_disables_pagination() {
        let query = ResourceQuery::from_params("", "", Some(1), Some(0));
        assert_eq!(query.pagination, None);
    }
}
