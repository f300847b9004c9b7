//! Corpus service client with a trait-based seam.
//!
//! [`CorpusApi`] is the interface the feed components depend on. The
//! production implementation is [`HttpApi`]; tests use the scripted
//! [`mock::MockCorpus`].

mod http;
pub mod mock;

pub use http::HttpApi;
pub use mock::MockCorpus;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::{Paper, SavedFilterCollection, SavedQueryForm};
use crate::query::RequestParams;

/// Errors surfaced by the corpus service client.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Transport-level failure (connection, timeout, body read)
    #[error("network error: {0}")]
    Network(String),

    /// 403 response; the session is no longer authorized
    #[error("not authorized")]
    Unauthorized,

    /// Any other non-200 response
    #[error("server rejected request: status {status}: {message}")]
    ServerRejected {
        /// HTTP status code
        status: u16,
        /// Response body, when readable
        message: String,
    },

    /// Malformed response payload
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Network(err.to_string())
    }
}

impl ApiError {
    /// Whether this error is a 403 that must be forwarded to the session gate
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// One page of results.
///
/// The server also reports the `cutoff` timestamp it resolved the time
/// window to; the client carries it for diagnostics but bases no decisions
/// on it. The end of the stream is signalled only by an empty `papers` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaperPage {
    /// Papers in result order
    pub papers: Vec<Paper>,

    /// Resolved time-window cutoff (unix seconds)
    #[serde(default)]
    pub cutoff: Option<i64>,
}

/// Session state as reported by the login-check endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatus {
    /// Whether the session cookie is valid
    pub logged_in: bool,

    /// User name for a valid session
    #[serde(default)]
    pub user: Option<String>,
}

/// Interface to the corpus service.
///
/// Implementations must be cheap to share behind an `Arc`; all methods take
/// `&self`.
#[async_trait]
pub trait CorpusApi: Send + Sync + std::fmt::Debug {
    /// Fetch one page of papers for the composed parameters
    async fn fetch_page(&self, params: &RequestParams) -> Result<PaperPage, ApiError>;

    /// List the category vocabulary
    async fn categories(&self) -> Result<Vec<String>, ApiError>;

    /// List the known affiliations
    async fn organizations(&self) -> Result<Vec<String>, ApiError>;

    /// List the user's saved filter collections
    async fn saved_collections(&self) -> Result<Vec<SavedFilterCollection>, ApiError>;

    /// Persist a new saved collection
    async fn save_collection(&self, form: &SavedQueryForm) -> Result<(), ApiError>;

    /// Delete a saved collection by server id
    async fn delete_collection(&self, query_id: &str) -> Result<(), ApiError>;

    /// Mark a paper as a favorite
    async fn add_favorite(&self, paper_id: &str) -> Result<(), ApiError>;

    /// Remove a paper from favorites
    async fn remove_favorite(&self, paper_id: &str) -> Result<(), ApiError>;

    /// Authenticate; on success returns the session cookie to replay on
    /// subsequent requests
    async fn login(&self, name: &str, password: &str) -> Result<String, ApiError>;

    /// Report whether the current session cookie is still valid
    async fn login_check(&self) -> Result<LoginStatus, ApiError>;

    /// Invalidate the server-side session
    async fn logout(&self) -> Result<(), ApiError>;
}
