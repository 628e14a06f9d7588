use crate::config::{AppConfig, SearchSettings};
use crate::favourites::FavouritesStore;
use crate::genres::{GenreCatalog, GenreOption};
use crate::models::{MovieCard, MovieRecord, MovieSummary};
use crate::scroll::ItemKey;
use crate::search::{FilterPatch, RangeInput, SearchHandle, SearchSnapshot, FETCH_ERROR_MESSAGE};
use crate::storage::FileStore;
use crate::tmdb::{CatalogApi, Feed, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap
const HERO_TITLE: &str = "Stream. Discover. Enjoy.";
const HERO_TAGLINE: &str = "Watch your favorite movies and shows anytime, anywhere.";
const EMPTY_FAVOURITES: &str = "No favourite movies yet. Add some from the home page!";

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub favourites: FavouritesStore,
    pub search: SearchHandle,
    pub genres: Arc<GenreCatalog>,
}

impl AppState {
    /// Wires the session and genre catalog around an existing catalog client
    /// and favourites store.
    pub async fn new(
        catalog: Arc<dyn CatalogApi>,
        favourites: FavouritesStore,
        settings: SearchSettings,
    ) -> Self {
        let genres = Arc::new(GenreCatalog::load(catalog.as_ref()).await);
        let search = SearchHandle::spawn(catalog.clone(), settings);
        Self {
            catalog,
            favourites,
            search,
            genres,
        }
    }
}

pub async fn run_server(config: AppConfig) -> Result<()> {
    config.log_summary();
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::new(&config.tmdb)?);
    let storage = FileStore::new(&config.data_dir);
    info!("Using data directory {:?}", storage.dir());
    let favourites =
        tokio::task::spawn_blocking(move || FavouritesStore::load(Arc::new(storage))).await?;

    let state = AppState::new(catalog, favourites, config.search.clone()).await;
    let app = build_router(state);

    info!("Listening on {}", config.bind_addr);
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/home", get(home_view))
        .route("/api/genres", get(genre_options))
        .route(
            "/api/search",
            get(search_view).patch(update_search).delete(reset_search),
        )
        .route("/api/search/visible", post(report_visibility))
        .route("/api/favourites", get(favourites_view))
        .route("/api/favourites/toggle", post(toggle_favourite))
        .route("/api/favourites/:id", delete(remove_favourite))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn internal(e: tokio::task::JoinError) -> Self {
        warn!("Favourites update did not complete: {}", e);
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "favourites update failed".to_string(),
        }
    }

    fn unavailable(e: anyhow::Error) -> Self {
        warn!("Search session unavailable: {:#}", e);
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: e.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({"status": "error", "message": self.message})),
        )
            .into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct Hero {
    pub title: &'static str,
    pub tagline: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Carousel {
    pub title: &'static str,
    pub movies: Vec<MovieCard>,
    pub error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct SearchView {
    pub search_term: String,
    pub selected_genre: String,
    pub year_range: RangeInput,
    pub rating_range: RangeInput,
    pub page: u32,
    pub has_more: bool,
    pub loading: bool,
    pub error: Option<String>,
    pub results: Vec<MovieCard>,
    pub last_item: Option<ItemKey>,
}

impl SearchView {
    fn from_snapshot(snapshot: SearchSnapshot, favourites: &FavouritesStore) -> Self {
        let results = snapshot
            .results
            .iter()
            .map(|m| MovieCard::from_record(m, favourites.contains(m.id)))
            .collect();
        Self {
            search_term: snapshot.search_term,
            selected_genre: snapshot.selected_genre,
            year_range: snapshot.year_range,
            rating_range: snapshot.rating_range,
            page: snapshot.page,
            has_more: snapshot.has_more,
            loading: snapshot.loading,
            error: snapshot.error,
            results,
            last_item: snapshot.last_item,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomeView {
    pub hero: Option<Hero>,
    pub carousels: Vec<Carousel>,
    pub genres: Vec<GenreOption>,
    pub search: SearchView,
    pub footer: String,
}

#[derive(Debug, Serialize)]
pub struct FavouritesView {
    pub movies: Vec<MovieCard>,
    pub empty_message: Option<&'static str>,
    pub footer: String,
}

#[derive(Debug, Serialize)]
pub struct ToggleResponse {
    pub favourite: bool,
    pub favourites: Vec<MovieSummary>,
}

#[derive(Debug, Deserialize)]
pub struct VisibilityReport {
    #[serde(flatten)]
    pub item: ItemKey,
    #[serde(default = "visible_default")]
    pub visible: bool,
}

fn visible_default() -> bool {
    true
}

fn footer() -> String {
    format!("© {} MovieMania. All rights reserved.", Utc::now().year())
}

async fn load_carousel(state: &AppState, feed: Feed) -> Carousel {
    match state.catalog.feed(feed).await {
        Ok(page) => Carousel {
            title: feed.title(),
            movies: page
                .results
                .iter()
                .map(|m| MovieCard::from_record(m, state.favourites.contains(m.id)))
                .collect(),
            error: None,
        },
        Err(e) => {
            warn!("Failed to load {} carousel: {:#}", feed, e);
            Carousel {
                title: feed.title(),
                movies: Vec::new(),
                error: Some(FETCH_ERROR_MESSAGE),
            }
        }
    }
}

async fn home_view(State(state): State<AppState>) -> Json<HomeView> {
    let snapshot = state.search.snapshot();
    let idle = snapshot.show_hero;
    // Carousels and hero only show while no search or filter is active.
    let carousels = if idle {
        let (trending, top_rated, upcoming) = tokio::join!(
            load_carousel(&state, Feed::Trending),
            load_carousel(&state, Feed::TopRated),
            load_carousel(&state, Feed::Upcoming),
        );
        vec![trending, top_rated, upcoming]
    } else {
        Vec::new()
    };
    Json(HomeView {
        hero: idle.then_some(Hero {
            title: HERO_TITLE,
            tagline: HERO_TAGLINE,
        }),
        carousels,
        genres: state.genres.options(),
        search: SearchView::from_snapshot(snapshot, &state.favourites),
        footer: footer(),
    })
}

async fn genre_options(State(state): State<AppState>) -> Json<Vec<GenreOption>> {
    Json(state.genres.options())
}

async fn search_view(State(state): State<AppState>) -> Json<SearchView> {
    Json(SearchView::from_snapshot(
        state.search.snapshot(),
        &state.favourites,
    ))
}

async fn update_search(
    State(state): State<AppState>,
    Json(patch): Json<FilterPatch>,
) -> Result<StatusCode, ApiError> {
    state.search.update(patch).map_err(ApiError::unavailable)?;
    Ok(StatusCode::ACCEPTED)
}

async fn reset_search(State(state): State<AppState>) -> Result<StatusCode, ApiError> {
    state.search.reset().map_err(ApiError::unavailable)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn report_visibility(
    State(state): State<AppState>,
    Json(report): Json<VisibilityReport>,
) -> Result<StatusCode, ApiError> {
    state
        .search
        .report_visibility(report.item, report.visible)
        .map_err(ApiError::unavailable)?;
    Ok(StatusCode::ACCEPTED)
}

async fn favourites_view(State(state): State<AppState>) -> Json<FavouritesView> {
    let movies: Vec<MovieCard> = state
        .favourites
        .favourites()
        .iter()
        .map(MovieCard::from_summary)
        .collect();
    Json(FavouritesView {
        empty_message: movies.is_empty().then_some(EMPTY_FAVOURITES),
        movies,
        footer: footer(),
    })
}

async fn toggle_favourite(
    State(state): State<AppState>,
    Json(movie): Json<MovieRecord>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let favourites = state.favourites.clone();
    let favourite = tokio::task::spawn_blocking(move || favourites.toggle(&movie))
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(ToggleResponse {
        favourite,
        favourites: state.favourites.favourites(),
    }))
}

async fn remove_favourite(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<MovieSummary>>, ApiError> {
    let favourites = state.favourites.clone();
    tokio::task::spawn_blocking(move || favourites.remove(id))
        .await
        .map_err(ApiError::internal)?;
    Ok(Json(state.favourites.favourites()))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}
