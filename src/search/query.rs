use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::MoviePage;
use crate::tmdb::{CatalogApi, DiscoverFilters};

/// A min/max pair as typed by the user. Empty strings mean "unset".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeInput {
    #[serde(default)]
    pub min: String,
    #[serde(default)]
    pub max: String,
}

impl RangeInput {
    pub fn is_empty(&self) -> bool {
        self.min.trim().is_empty() && self.max.trim().is_empty()
    }
}

/// The user-controlled inputs that select which catalog query runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Filters {
    pub search_term: String,
    pub selected_genre: String,
    pub year_range: RangeInput,
    pub rating_range: RangeInput,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.search_term.trim().is_empty()
            && self.selected_genre.trim().is_empty()
            && self.year_range.is_empty()
            && self.rating_range.is_empty()
    }

    /// Text search wins over discovery; the upstream API cannot combine them.
    pub fn query(&self, page: u32) -> Option<CatalogQuery> {
        if self.is_empty() {
            return None;
        }
        let term = self.search_term.trim();
        if !term.is_empty() {
            return Some(CatalogQuery::Search {
                query: term.to_string(),
                page,
            });
        }
        Some(CatalogQuery::Discover {
            filters: self.discover_filters(),
            page,
        })
    }

    fn discover_filters(&self) -> DiscoverFilters {
        DiscoverFilters {
            genre_id: parse_field("genre", &self.selected_genre),
            year_min: parse_field("year min", &self.year_range.min),
            year_max: parse_field("year max", &self.year_range.max),
            rating_min: parse_field("rating min", &self.rating_range.min),
            rating_max: parse_field("rating max", &self.rating_range.max),
        }
    }
}

// Unparseable input is left out of the query rather than rejected.
fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Option<T> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!("Ignoring {} filter value '{}'", name, raw);
            None
        }
    }
}

/// Partial update of the filters; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterPatch {
    pub search_term: Option<String>,
    pub selected_genre: Option<String>,
    pub year_min: Option<String>,
    pub year_max: Option<String>,
    pub rating_min: Option<String>,
    pub rating_max: Option<String>,
}

impl FilterPatch {
    pub fn search(term: &str) -> Self {
        Self {
            search_term: Some(term.to_string()),
            ..Self::default()
        }
    }

    pub fn apply(&self, filters: &mut Filters) -> bool {
        let mut changed = false;
        let fields = [
            (&self.search_term, &mut filters.search_term),
            (&self.selected_genre, &mut filters.selected_genre),
            (&self.year_min, &mut filters.year_range.min),
            (&self.year_max, &mut filters.year_range.max),
            (&self.rating_min, &mut filters.rating_range.min),
            (&self.rating_max, &mut filters.rating_range.max),
        ];
        for (update, field) in fields {
            if let Some(value) = update {
                if *field != *value {
                    *field = value.clone();
                    changed = true;
                }
            }
        }
        changed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CatalogQuery {
    Search { query: String, page: u32 },
    Discover { filters: DiscoverFilters, page: u32 },
}

impl CatalogQuery {
    pub fn page(&self) -> u32 {
        match self {
            CatalogQuery::Search { page, .. } | CatalogQuery::Discover { page, .. } => *page,
        }
    }

    pub async fn run(&self, catalog: &dyn CatalogApi) -> Result<MoviePage> {
        match self {
            CatalogQuery::Search { query, page } => catalog.search(query, *page).await,
            CatalogQuery::Discover { filters, page } => catalog.discover(filters, *page).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_filters_issue_no_query() {
        let filters = Filters {
            search_term: "   ".to_string(),
            ..Filters::default()
        };
        assert!(filters.is_empty());
        assert_eq!(filters.query(1), None);
    }

    #[test]
    fn search_term_selects_text_search_and_ignores_other_filters() {
        let filters = Filters {
            search_term: " dune ".to_string(),
            selected_genre: "878".to_string(),
            ..Filters::default()
        };
        assert_eq!(
            filters.query(3),
            Some(CatalogQuery::Search {
                query: "dune".to_string(),
                page: 3
            })
        );
    }

    #[test]
    fn other_filters_select_discovery() {
        let filters = Filters {
            selected_genre: "18".to_string(),
            year_range: RangeInput {
                min: "1990".to_string(),
                max: "".to_string(),
            },
            rating_range: RangeInput {
                min: "7.5".to_string(),
                max: "high".to_string(),
            },
            ..Filters::default()
        };
        assert_eq!(
            filters.query(1),
            Some(CatalogQuery::Discover {
                filters: DiscoverFilters {
                    genre_id: Some(18),
                    year_min: Some(1990),
                    year_max: None,
                    rating_min: Some(7.5),
                    rating_max: None,
                },
                page: 1
            })
        );
    }

    #[test]
    fn patch_reports_only_real_changes() {
        let mut filters = Filters::default();
        assert!(FilterPatch::search("dune").apply(&mut filters));
        assert!(!FilterPatch::search("dune").apply(&mut filters));
        assert!(!FilterPatch::default().apply(&mut filters));

        let patch = FilterPatch {
            year_max: Some("2000".to_string()),
            ..FilterPatch::default()
        };
        assert!(patch.apply(&mut filters));
        assert_eq!(filters.year_range.max, "2000");
        assert_eq!(filters.search_term, "dune");
    }
}
