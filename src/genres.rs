//! Genre options for the discovery filter, with a fallback set.
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::tmdb::CatalogApi;

static FALLBACK_GENRES: Lazy<BTreeMap<u32, String>> = Lazy::new(|| {
    [
        (28, "Action"),
        (35, "Comedy"),
        (18, "Drama"),
        (27, "Horror"),
        (10749, "Romance"),
        (878, "Science Fiction"),
        (53, "Thriller"),
    ]
    .into_iter()
    .map(|(id, name)| (id, name.to_string()))
    .collect()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenreSource {
    Remote,
    Fallback,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GenreOption {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct GenreCatalog {
    genres: BTreeMap<u32, String>,
    source: GenreSource,
}

impl GenreCatalog {
    pub async fn load(catalog: &dyn CatalogApi) -> Self {
        match catalog.genres().await {
            Ok(list) if !list.is_empty() => {
                info!("Loaded {} genres", list.len());
                Self {
                    genres: list.into_iter().map(|g| (g.id, g.name)).collect(),
                    source: GenreSource::Remote,
                }
            }
            Ok(_) => {
                warn!("Genre list came back empty, using fallback genres");
                Self::fallback()
            }
            Err(e) => {
                warn!("Failed to fetch genres, using fallback: {:#}", e);
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> Self {
        Self {
            genres: FALLBACK_GENRES.clone(),
            source: GenreSource::Fallback,
        }
    }

    pub fn source(&self) -> GenreSource {
        self.source
    }

    pub fn name(&self, id: u32) -> Option<&str> {
        self.genres.get(&id).map(String::as_str)
    }

    /// Options sorted by name, as a selector lists them.
    pub fn options(&self) -> Vec<GenreOption> {
        let mut options: Vec<GenreOption> = self
            .genres
            .iter()
            .map(|(id, name)| GenreOption {
                id: *id,
                name: name.clone(),
            })
            .collect();
        options.sort_by(|a, b| a.name.cmp(&b.name));
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Genre, MoviePage};
    use crate::tmdb::{DiscoverFilters, Feed};
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;

    struct GenreOnly(Option<Vec<Genre>>);

    #[async_trait]
    impl CatalogApi for GenreOnly {
        async fn feed(&self, _feed: Feed) -> Result<MoviePage> {
            Err(anyhow!("unused"))
        }
        async fn genres(&self) -> Result<Vec<Genre>> {
            self.0.clone().ok_or_else(|| anyhow!("offline"))
        }
        async fn search(&self, _query: &str, _page: u32) -> Result<MoviePage> {
            Err(anyhow!("unused"))
        }
        async fn discover(&self, _filters: &DiscoverFilters, _page: u32) -> Result<MoviePage> {
            Err(anyhow!("unused"))
        }
    }

    #[tokio::test]
    async fn uses_remote_genres_when_available() {
        let catalog = GenreOnly(Some(vec![
            Genre {
                id: 99,
                name: "Documentary".to_string(),
            },
            Genre {
                id: 16,
                name: "Animation".to_string(),
            },
        ]));
        let genres = GenreCatalog::load(&catalog).await;
        assert_eq!(genres.source(), GenreSource::Remote);
        assert_eq!(genres.name(99), Some("Documentary"));
        let names: Vec<String> = genres.options().into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["Animation", "Documentary"]);
    }

    #[tokio::test]
    async fn falls_back_on_failure() {
        let genres = GenreCatalog::load(&GenreOnly(None)).await;
        assert_eq!(genres.source(), GenreSource::Fallback);
        assert_eq!(genres.name(878), Some("Science Fiction"));
        assert_eq!(genres.options().len(), 7);
    }
}
