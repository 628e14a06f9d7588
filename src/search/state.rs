use anyhow::Error;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

use super::query::{CatalogQuery, FilterPatch, Filters, RangeInput};
use crate::config::DuplicatePolicy;
use crate::models::{MoviePage, MovieRecord};
use crate::scroll::ItemKey;

pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch movies. Please try again later.";

/// Identifies one issued fetch. Only the ticket of the most recent fetch is
/// accepted when responses come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterChange {
    Unchanged,
    Idle,
    Pending,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchSnapshot {
    pub search_term: String,
    pub selected_genre: String,
    pub year_range: RangeInput,
    pub rating_range: RangeInput,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub show_hero: bool,
    pub error: Option<String>,
    pub results: Vec<MovieRecord>,
    pub last_item: Option<ItemKey>,
}

#[derive(Debug)]
pub struct SearchController {
    filters: Filters,
    page: u32,
    // Last page whose results are part of `results`.
    loaded_page: u32,
    has_more: bool,
    results: Vec<MovieRecord>,
    error: Option<String>,
    generation: u64,
    in_flight: Option<FetchTicket>,
    duplicates: DuplicatePolicy,
}

impl SearchController {
    pub fn new(duplicates: DuplicatePolicy) -> Self {
        Self {
            filters: Filters::default(),
            page: 1,
            loaded_page: 0,
            has_more: false,
            results: Vec::new(),
            error: None,
            generation: 0,
            in_flight: None,
            duplicates,
        }
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn results(&self) -> &[MovieRecord] {
        &self.results
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn in_flight(&self) -> Option<FetchTicket> {
        self.in_flight
    }

    pub fn is_idle(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn apply_patch(&mut self, patch: &FilterPatch) -> FilterChange {
        if !patch.apply(&mut self.filters) {
            return FilterChange::Unchanged;
        }
        self.restart();
        if self.filters.is_empty() {
            self.error = None;
            FilterChange::Idle
        } else {
            FilterChange::Pending
        }
    }

    pub fn reset(&mut self) {
        self.filters = Filters::default();
        self.restart();
        self.error = None;
    }

    fn restart(&mut self) {
        self.page = 1;
        self.loaded_page = 0;
        self.has_more = false;
        self.results.clear();
        self.generation += 1;
        self.in_flight = None;
    }

    pub fn begin_fetch(&mut self) -> Option<(FetchTicket, CatalogQuery)> {
        let query = self.filters.query(self.page)?;
        self.generation += 1;
        let ticket = FetchTicket {
            generation: self.generation,
            page: self.page,
        };
        self.in_flight = Some(ticket);
        self.error = None;
        debug!(generation = ticket.generation, page = ticket.page, "Issuing fetch");
        Some((ticket, query))
    }

    pub fn advance_page(&mut self) -> bool {
        if !self.has_more || self.is_idle() {
            return false;
        }
        self.page += 1;
        true
    }

    fn is_current(&self, ticket: FetchTicket) -> bool {
        self.in_flight == Some(ticket)
    }

    pub fn apply_page(&mut self, ticket: FetchTicket, response: MoviePage) -> bool {
        if !self.is_current(ticket) {
            debug!(
                generation = ticket.generation,
                current = self.generation,
                "Discarding stale response"
            );
            return false;
        }
        self.in_flight = None;
        self.has_more = response.has_more();
        if ticket.page <= 1 {
            self.results = response.results;
        } else {
            match self.duplicates {
                DuplicatePolicy::Keep => self.results.extend(response.results),
                DuplicatePolicy::DropRepeated => {
                    let mut seen: HashSet<i64> = self.results.iter().map(|m| m.id).collect();
                    self.results
                        .extend(response.results.into_iter().filter(|m| seen.insert(m.id)));
                }
            }
        }
        self.loaded_page = ticket.page;
        true
    }

    // A failed next page rolls `page` back so the same page is requested again.
    pub fn apply_failure(&mut self, ticket: FetchTicket, error: &Error) -> bool {
        if !self.is_current(ticket) {
            debug!(generation = ticket.generation, "Discarding stale failure");
            return false;
        }
        warn!("Error fetching movies (page {}): {:#}", ticket.page, error);
        self.in_flight = None;
        self.error = Some(FETCH_ERROR_MESSAGE.to_string());
        if ticket.page > 1 {
            self.page = self.loaded_page.max(1);
        }
        true
    }

    pub fn last_item_key(&self) -> Option<ItemKey> {
        self.results.last().map(|m| ItemKey {
            position: self.results.len() - 1,
            movie_id: m.id,
        })
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        SearchSnapshot {
            search_term: self.filters.search_term.clone(),
            selected_genre: self.filters.selected_genre.clone(),
            year_range: self.filters.year_range.clone(),
            rating_range: self.filters.rating_range.clone(),
            page: self.page,
            has_more: self.has_more,
            loading: self.in_flight.is_some(),
            show_hero: self.is_idle(),
            error: self.error.clone(),
            results: self.results.clone(),
            last_item: self.last_item_key(),
        }
    }
}

impl Default for SearchController {
    fn default() -> Self {
        Self::new(DuplicatePolicy::Keep)
    }
}
