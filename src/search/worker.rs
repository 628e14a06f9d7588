use anyhow::{anyhow, Result};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use super::query::FilterPatch;
use super::state::{FetchTicket, FilterChange, SearchController, SearchSnapshot};
use crate::config::SearchSettings;
use crate::models::MoviePage;
use crate::scroll::{InfiniteScrollTrigger, ItemKey};
use crate::tmdb::CatalogApi;

#[derive(Debug)]
pub enum SearchCommand {
    Update(FilterPatch),
    Visibility { item: ItemKey, visible: bool },
    Reset,
}

struct FetchOutcome {
    ticket: FetchTicket,
    result: Result<MoviePage>,
}

#[derive(Clone)]
pub struct SearchHandle {
    commands: mpsc::UnboundedSender<SearchCommand>,
    snapshots: watch::Receiver<SearchSnapshot>,
}

impl SearchHandle {
    pub fn spawn(catalog: Arc<dyn CatalogApi>, settings: SearchSettings) -> Self {
        let controller = SearchController::new(settings.duplicates);
        let (snapshot_tx, snapshots) = watch::channel(controller.snapshot());
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();

        let worker = SearchWorker {
            controller,
            scroll: InfiniteScrollTrigger::default(),
            catalog,
            settings,
            snapshots: snapshot_tx,
            outcomes: outcome_tx,
            debounce_deadline: None,
        };
        tokio::spawn(worker.run(command_rx, outcome_rx));

        Self {
            commands,
            snapshots,
        }
    }

    pub fn update(&self, patch: FilterPatch) -> Result<()> {
        self.send(SearchCommand::Update(patch))
    }

    pub fn report_visibility(&self, item: ItemKey, visible: bool) -> Result<()> {
        self.send(SearchCommand::Visibility { item, visible })
    }

    pub fn reset(&self) -> Result<()> {
        self.send(SearchCommand::Reset)
    }

    pub fn snapshot(&self) -> SearchSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.snapshots.clone()
    }

    fn send(&self, command: SearchCommand) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| anyhow!("search session has stopped"))
    }
}

enum Wake {
    Command(Option<SearchCommand>),
    Outcome(FetchOutcome),
    Debounced,
}

struct SearchWorker {
    controller: SearchController,
    scroll: InfiniteScrollTrigger,
    catalog: Arc<dyn CatalogApi>,
    settings: SearchSettings,
    snapshots: watch::Sender<SearchSnapshot>,
    outcomes: mpsc::UnboundedSender<FetchOutcome>,
    debounce_deadline: Option<Instant>,
}

impl SearchWorker {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<SearchCommand>,
        mut outcomes: mpsc::UnboundedReceiver<FetchOutcome>,
    ) {
        debug!("Search session started");
        loop {
            let deadline = self.debounce_deadline;
            let wake = tokio::select! {
                cmd = commands.recv() => Wake::Command(cmd),
                Some(outcome) = outcomes.recv() => Wake::Outcome(outcome),
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    Wake::Debounced
                }
            };

            match wake {
                Wake::Command(None) => break,
                Wake::Command(Some(command)) => self.handle_command(command),
                Wake::Outcome(outcome) => self.handle_outcome(outcome),
                Wake::Debounced => {
                    self.debounce_deadline = None;
                    self.fetch();
                }
            }
            self.publish();
        }
        debug!("Search session stopped");
    }

    fn handle_command(&mut self, command: SearchCommand) {
        match command {
            SearchCommand::Update(patch) => match self.controller.apply_patch(&patch) {
                FilterChange::Unchanged => {}
                FilterChange::Idle => {
                    self.debounce_deadline = None;
                }
                FilterChange::Pending => {
                    self.debounce_deadline = Some(Instant::now() + self.settings.debounce);
                }
            },
            SearchCommand::Visibility { item, visible } => {
                let can_load = self.controller.has_more() && self.controller.in_flight().is_none();
                if self.scroll.on_visibility(item, visible, can_load)
                    && self.controller.advance_page()
                {
                    debug!(page = self.controller.page(), "Loading next page");
                    self.fetch();
                }
            }
            SearchCommand::Reset => {
                info!("Search session reset");
                self.controller.reset();
                self.debounce_deadline = None;
                self.scroll.disconnect();
            }
        }
    }

    fn handle_outcome(&mut self, outcome: FetchOutcome) {
        match outcome.result {
            Ok(page) => {
                let last = self.controller.last_item_key();
                // A page that adds nothing leaves the same last element in view.
                if self.controller.apply_page(outcome.ticket, page)
                    && self.controller.last_item_key() == last
                {
                    self.scroll.rearm();
                }
            }
            Err(e) => {
                if self.controller.apply_failure(outcome.ticket, &e) {
                    self.scroll.rearm();
                }
            }
        }
    }

    fn fetch(&mut self) {
        let Some((ticket, query)) = self.controller.begin_fetch() else {
            return;
        };
        let catalog = self.catalog.clone();
        let outcomes = self.outcomes.clone();
        tokio::spawn(async move {
            let result = query.run(catalog.as_ref()).await;
            let _ = outcomes.send(FetchOutcome { ticket, result });
        });
    }

    fn publish(&mut self) {
        let snapshot = self.controller.snapshot();
        self.scroll.observe(snapshot.last_item);
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                false
            } else {
                *current = snapshot;
                true
            }
        });
    }
}
