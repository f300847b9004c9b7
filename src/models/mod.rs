//! Core data models for papers, queries, filters, and saved collections.

mod paper;
mod query;

pub use paper::{Author, Paper, PaperBuilder};
pub use query::{
    Filters, SavedFilterCollection, SavedQueryForm, SearchQuery, SearchType, Tab, TimeWindow,
};
