//! Infinite scroll: fires once when the last rendered result becomes visible.
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Identity of a rendered result tile. The position disambiguates repeated
/// movie ids across pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemKey {
    pub position: usize,
    pub movie_id: i64,
}

#[derive(Debug, Clone, Copy)]
struct Observation {
    target: ItemKey,
    fired: bool,
}

#[derive(Debug, Default)]
pub struct InfiniteScrollTrigger {
    observed: Option<Observation>,
}

impl InfiniteScrollTrigger {
    pub fn observed(&self) -> Option<ItemKey> {
        self.observed.map(|o| o.target)
    }

    // Re-observing the same element keeps its fired state.
    pub fn observe(&mut self, target: Option<ItemKey>) {
        if self.observed() == target {
            return;
        }
        if let Some(old) = self.observed.take() {
            debug!(item = ?old.target, "Disconnected scroll observation");
        }
        self.observed = target.map(|target| Observation {
            target,
            fired: false,
        });
    }

    pub fn disconnect(&mut self) {
        self.observed = None;
    }

    pub fn rearm(&mut self) {
        if let Some(o) = self.observed.as_mut() {
            o.fired = false;
        }
    }

    /// Returns true when the caller should load the next page. Leaving the
    /// viewport lets the element fire again on its next entry.
    pub fn on_visibility(&mut self, target: ItemKey, visible: bool, has_more: bool) -> bool {
        let Some(o) = self.observed.as_mut() else {
            return false;
        };
        if o.target != target {
            return false;
        }
        if !visible {
            o.fired = false;
            return false;
        }
        if !has_more || o.fired {
            return false;
        }
        o.fired = true;
        true
    }
}
