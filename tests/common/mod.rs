#![allow(dead_code)]

use anyhow::anyhow;
use moviemania::models::{Genre, MoviePage, MovieRecord};
use moviemania::tmdb::{CatalogApi, DiscoverFilters, Feed};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Scripted catalog. Unknown requests fail like an HTTP error would.
#[derive(Default)]
pub struct FakeCatalog {
    pub pages: Mutex<HashMap<(String, u32), MoviePage>>,
    pub delays: Mutex<HashMap<String, Duration>>,
    pub feeds: Mutex<HashMap<&'static str, MoviePage>>,
    pub genres: Option<Vec<Genre>>,
    pub calls: Mutex<Vec<(String, u32)>>,
}

impl FakeCatalog {
    pub fn with_page(self, key: &str, page: MoviePage) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert((key.to_string(), page.page), page);
        self
    }

    pub fn with_delay(self, key: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().insert(key.to_string(), delay);
        self
    }

    pub fn with_feed(self, feed: Feed, page: MoviePage) -> Self {
        self.feeds.lock().unwrap().insert(feed.title(), page);
        self
    }

    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }

    async fn respond(&self, key: String, page: u32) -> anyhow::Result<MoviePage> {
        self.calls.lock().unwrap().push((key.clone(), page));
        let delay = self.delays.lock().unwrap().get(&key).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.pages
            .lock()
            .unwrap()
            .get(&(key.clone(), page))
            .cloned()
            .ok_or_else(|| anyhow!("HTTP 500 for {} page {}", key, page))
    }
}

#[async_trait::async_trait]
impl CatalogApi for FakeCatalog {
    async fn feed(&self, feed: Feed) -> anyhow::Result<MoviePage> {
        self.feeds
            .lock()
            .unwrap()
            .get(feed.title())
            .cloned()
            .ok_or_else(|| anyhow!("feed {} unavailable", feed))
    }

    async fn genres(&self) -> anyhow::Result<Vec<Genre>> {
        self.genres.clone().ok_or_else(|| anyhow!("genres unavailable"))
    }

    async fn search(&self, query: &str, page: u32) -> anyhow::Result<MoviePage> {
        self.respond(query.to_string(), page).await
    }

    async fn discover(&self, _filters: &DiscoverFilters, page: u32) -> anyhow::Result<MoviePage> {
        self.respond("discover".to_string(), page).await
    }
}

pub fn movie_page(movies: &[(i64, &str)], page: u32, total_pages: u32) -> MoviePage {
    MoviePage {
        results: movies
            .iter()
            .map(|(id, title)| MovieRecord::new(*id, title))
            .collect(),
        page,
        total_pages,
    }
}
