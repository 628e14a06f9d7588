//! Search and filter session: filter inputs, pagination and the debounced
//! fetch loop that drives the catalog.
mod query;
mod state;
mod worker;

pub use query::{CatalogQuery, FilterPatch, Filters, RangeInput};
pub use state::{
    FetchTicket, FilterChange, SearchController, SearchSnapshot, FETCH_ERROR_MESSAGE,
};
pub use worker::{SearchCommand, SearchHandle};
