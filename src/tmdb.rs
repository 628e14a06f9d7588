use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use crate::config::TmdbSettings;
use crate::models::{Genre, MoviePage};

/// The fixed browse feeds shown as carousels on the home view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    Trending,
    TopRated,
    Upcoming,
}

impl Feed {
    fn path(&self) -> &'static str {
        match self {
            Feed::Trending => "trending/movie/week",
            Feed::TopRated => "movie/top_rated",
            Feed::Upcoming => "movie/upcoming",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Feed::Trending => "Trending Now",
            Feed::TopRated => "Top Rated",
            Feed::Upcoming => "Upcoming",
        }
    }
}

impl std::str::FromStr for Feed {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "trending" => Ok(Feed::Trending),
            "top_rated" | "top-rated" => Ok(Feed::TopRated),
            "upcoming" => Ok(Feed::Upcoming),
            _ => Err(anyhow!("feed must be 'trending', 'top_rated' or 'upcoming'")),
        }
    }
}

impl fmt::Display for Feed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Parameters of the filtered discovery endpoint. Unset bounds are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscoverFilters {
    pub genre_id: Option<u32>,
    pub year_min: Option<i32>,
    pub year_max: Option<i32>,
    pub rating_min: Option<f32>,
    pub rating_max: Option<f32>,
}

impl DiscoverFilters {
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(genre) = self.genre_id {
            params.push(("with_genres", genre.to_string()));
        }
        if let Some(year) = self.year_min {
            params.push(("primary_release_date.gte", format!("{year}-01-01")));
        }
        if let Some(year) = self.year_max {
            params.push(("primary_release_date.lte", format!("{year}-12-31")));
        }
        if let Some(rating) = self.rating_min {
            params.push(("vote_average.gte", rating.to_string()));
        }
        if let Some(rating) = self.rating_max {
            params.push(("vote_average.lte", rating.to_string()));
        }
        params
    }
}

#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn feed(&self, feed: Feed) -> Result<MoviePage>;
    async fn genres(&self) -> Result<Vec<Genre>>;
    async fn search(&self, query: &str, page: u32) -> Result<MoviePage>;
    async fn discover(&self, filters: &DiscoverFilters, page: u32) -> Result<MoviePage>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl TmdbClient {
    pub fn new(settings: &TmdbSettings) -> Result<Self> {
        let user_agent = format!("moviemania/{}", env!("CARGO_PKG_VERSION"));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .context("Failed to build TMDB HTTP client")?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    /// Builds `<base>/<path>?api_key=..&k=v..`. Fails when either setting is
    /// missing so callers take their normal error path.
    pub fn url(&self, path: &str, params: &[(&str, String)]) -> Result<String> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| anyhow!("TMDB_BASE_URL is not configured"))?;
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("TMDB_API_KEY is not configured"))?;
        let mut url = format!("{base}/{path}?api_key={}", urlencoding::encode(api_key));
        for (key, value) in params {
            url.push('&');
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        Ok(url)
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let res = self
            .client
            .get(url)
            .send()
            .await
            .context("request failed")?;
        let status = res.status();
        let text = res.text().await.context("reading body failed")?;
        if !status.is_success() {
            return Err(anyhow!("TMDB responded {}: {}", status, text));
        }
        let parsed: T = serde_json::from_str(&text).context("JSON parse failed")?;
        Ok(parsed)
    }
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn feed(&self, feed: Feed) -> Result<MoviePage> {
        let url = self.url(feed.path(), &[])?;
        debug!("Fetching feed {}", feed);
        self.get_json(&url).await
    }

    async fn genres(&self) -> Result<Vec<Genre>> {
        #[derive(Deserialize)]
        struct GenreList {
            #[serde(default)]
            genres: Vec<Genre>,
        }

        let url = self.url("genre/movie/list", &[])?;
        let data: GenreList = self.get_json(&url).await?;
        Ok(data.genres)
    }

    async fn search(&self, query: &str, page: u32) -> Result<MoviePage> {
        let url = self.url(
            "search/movie",
            &[("query", query.to_string()), ("page", page.to_string())],
        )?;
        debug!("Searching '{}' page {}", query, page);
        self.get_json(&url).await
    }

    async fn discover(&self, filters: &DiscoverFilters, page: u32) -> Result<MoviePage> {
        let mut params = filters.query_params();
        params.push(("page", page.to_string()));
        let url = self.url("discover/movie", &params)?;
        debug!("Discovering {:?} page {}", filters, page);
        self.get_json(&url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: Option<&str>, key: Option<&str>) -> TmdbClient {
        TmdbClient::new(&TmdbSettings {
            base_url: base.map(str::to_string),
            api_key: key.map(str::to_string),
        })
        .expect("client")
    }

    #[test]
    fn builds_search_url_with_encoded_query() {
        let c = client(Some("https://api.example/3"), Some("k"));
        let url = c
            .url(
                "search/movie",
                &[("query", "dune: part two".to_string()), ("page", "2".to_string())],
            )
            .expect("url");
        assert_eq!(
            url,
            "https://api.example/3/search/movie?api_key=k&query=dune%3A%20part%20two&page=2"
        );
    }

    #[test]
    fn missing_settings_fail_instead_of_panicking() {
        assert!(client(None, Some("k")).url("movie/upcoming", &[]).is_err());
        assert!(client(Some("https://api.example/3"), None)
            .url("movie/upcoming", &[])
            .is_err());
    }

    #[tokio::test]
    async fn unconfigured_client_fetch_is_an_error() {
        let c = client(None, None);
        assert!(c.search("dune", 1).await.is_err());
        assert!(c.feed(Feed::Trending).await.is_err());
    }

    #[test]
    fn discover_params_include_only_set_bounds() {
        let filters = DiscoverFilters {
            genre_id: Some(878),
            year_min: Some(1990),
            year_max: None,
            rating_min: None,
            rating_max: Some(8.5),
        };
        assert_eq!(
            filters.query_params(),
            vec![
                ("with_genres", "878".to_string()),
                ("primary_release_date.gte", "1990-01-01".to_string()),
                ("vote_average.lte", "8.5".to_string()),
            ]
        );
        assert!(DiscoverFilters::default().query_params().is_empty());
    }

    #[test]
    fn parses_feed_names() {
        assert_eq!("trending".parse::<Feed>().expect("feed"), Feed::Trending);
        assert_eq!("TOP_RATED".parse::<Feed>().expect("feed"), Feed::TopRated);
        assert!("popular".parse::<Feed>().is_err());
    }
}
