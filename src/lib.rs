//! # paperscope
//!
//! A client for browsing and filtering an arXiv-like paper corpus:
//! full-text/author search, multi-dimensional filtering, saved filter
//! collections, and incrementally-loaded result pages.
//!
//! ## Architecture
//!
//! - [`models`]: Core data structures (Paper, SearchQuery, Filters, ...)
//! - [`query`]: Canonical request composition from query/filters/tab state
//! - [`api`]: Corpus service client behind the [`api::CorpusApi`] trait
//! - [`feed`]: Pagination engine, saved-collection store, expansion state
//! - [`session`]: Authorization-failure gate
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output formatting for the CLI
//!
//! The interesting invariants live in [`feed`]: result streams are advanced
//! by generation-tagged fetches, so completions arriving out of order (or
//! after a reset) can never corrupt what the view renders.

pub mod api;
pub mod config;
pub mod feed;
pub mod models;
pub mod query;
pub mod session;
pub mod ui;

// Re-export commonly used types
pub use api::{ApiError, CorpusApi, HttpApi};
pub use feed::{Browser, PaginationEngine};
pub use models::Paper;
pub use session::SessionGate;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
