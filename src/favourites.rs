//! The favourites list and its persistence.
//!
//! The list lives in a `watch` channel so views can read the current value or
//! wait for changes. Every mutation is followed by a write of the whole list to
//! the key-value store. Write failures are logged and never roll back memory.
//! Mutations do blocking IO; async callers run them on the blocking pool.
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::models::{MovieRecord, MovieSummary};
use crate::storage::KeyValueStore;

pub const FAVOURITES_KEY: &str = "favoriteMovies";

#[derive(Clone)]
pub struct FavouritesStore {
    list: Arc<watch::Sender<Vec<MovieSummary>>>,
    storage: Arc<dyn KeyValueStore>,
    writes: Arc<Mutex<()>>,
}

impl FavouritesStore {
    pub fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let initial = match storage.get(FAVOURITES_KEY) {
            Ok(Some(raw)) => parse_favourites(&raw).unwrap_or_else(|e| {
                warn!("Ignoring stored favourites: {:#}", e);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to read stored favourites: {:#}", e);
                Vec::new()
            }
        };
        info!("Loaded {} favourite movies", initial.len());
        let (tx, _rx) = watch::channel(initial);
        Self {
            list: Arc::new(tx),
            storage,
            writes: Arc::new(Mutex::new(())),
        }
    }

    pub fn favourites(&self) -> Vec<MovieSummary> {
        self.list.borrow().clone()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.list.borrow().iter().any(|f| f.id == id)
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<MovieSummary>> {
        self.list.subscribe()
    }

    /// Adds the movie if absent, removes it otherwise. Returns whether the
    /// movie is a favourite afterwards.
    pub fn toggle(&self, movie: &MovieRecord) -> bool {
        let mut favourited = false;
        self.mutate(|list| {
            favourited = toggle_in(list, movie);
        });
        debug!(id = movie.id, favourited, "Toggled favourite");
        favourited
    }

    pub fn remove(&self, id: i64) {
        self.mutate(|list| {
            remove_in(list, id);
        });
        debug!(id, "Removed favourite");
    }

    // Mutators queue on `writes` so storage sees lists in the order they were
    // applied. Readers only wait for the in-memory update.
    fn mutate(&self, op: impl FnOnce(&mut Vec<MovieSummary>)) {
        let _write = self
            .writes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        self.list.send_modify(op);
        let saved = self.list.borrow().clone();
        if let Err(e) = persist(self.storage.as_ref(), &saved) {
            error!("Failed to save favourites: {:#}", e);
        }
    }
}

pub fn toggle_in(list: &mut Vec<MovieSummary>, movie: &MovieRecord) -> bool {
    if list.iter().any(|f| f.id == movie.id) {
        list.retain(|f| f.id != movie.id);
        false
    } else {
        list.push(MovieSummary::from(movie));
        true
    }
}

pub fn remove_in(list: &mut Vec<MovieSummary>, id: i64) {
    list.retain(|f| f.id != id);
}

pub fn parse_favourites(raw: &str) -> Result<Vec<MovieSummary>> {
    serde_json::from_str(raw).context("favourites are not a JSON list of movies")
}

pub fn serialize_favourites(list: &[MovieSummary]) -> Result<String> {
    serde_json::to_string(list).context("serializing favourites")
}

pub fn persist(storage: &dyn KeyValueStore, list: &[MovieSummary]) -> Result<()> {
    let raw = serialize_favourites(list)?;
    storage.set(FAVOURITES_KEY, &raw)
}
