//! The browsing feed: live result stream, saved collections, favorites.
//!
//! [`Browser`] holds the active query/filters/tab and the one live
//! [`PaginationEngine`] those drive. Changing any part of the scope
//! recomposes the request and resets the stream; the generation discipline
//! in [`pagination`] guarantees a reset always wins over in-flight fetches.

pub mod expansion;
pub mod pagination;
pub mod saved;

pub use expansion::{ExpansionCoordinator, Signal};
pub use pagination::{Applied, PageFetch, PaginationEngine, Phase};
pub use saved::{SavedCollectionStore, SavedEntry};

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::api::{ApiError, CorpusApi};
use crate::models::{Filters, SearchQuery, Tab, TimeWindow};
use crate::session::SessionGate;

/// Issue `fetch` against the service and report its completion back to the
/// engine under the generation it was issued with.
///
/// Failures surface as the engine's error phase; prior items stay intact
/// and no retry is attempted.
pub(crate) async fn run_page_fetch<A: CorpusApi + ?Sized>(
    api: &A,
    engine: &mut PaginationEngine,
    fetch: PageFetch,
) {
    match api.fetch_page(&fetch.params).await {
        Ok(page) => {
            engine.apply_page(fetch.generation, page.papers);
        }
        Err(err) => {
            tracing::warn!(error = %err, "page fetch failed");
            engine.apply_error(fetch.generation);
        }
    }
}

/// Top-level browsing state over a corpus service.
#[derive(Debug)]
pub struct Browser<A: CorpusApi> {
    api: Arc<A>,
    gate: Arc<dyn SessionGate>,
    query: SearchQuery,
    filters: Filters,
    tab: Tab,
    engine: PaginationEngine,
    saved: SavedCollectionStore<A>,
    available_categories: Vec<String>,
    available_affiliations: Vec<String>,
    logged_in: bool,
}

impl<A: CorpusApi> Browser<A> {
    /// Create a browser in the default scope (all papers, last day)
    pub fn new(api: Arc<A>, gate: Arc<dyn SessionGate>) -> Self {
        let query = SearchQuery::default();
        let filters = Filters::default();
        let tab = Tab::All;
        let engine = PaginationEngine::new(query.clone(), filters.clone(), tab);
        let saved = SavedCollectionStore::new(Arc::clone(&api), Arc::clone(&gate));
        Self {
            api,
            gate,
            query,
            filters,
            tab,
            engine,
            saved,
            available_categories: Vec::new(),
            available_affiliations: Vec::new(),
            logged_in: false,
        }
    }

    /// The live stream
    pub fn engine(&self) -> &PaginationEngine {
        &self.engine
    }

    /// The saved-collection store
    pub fn saved(&self) -> &SavedCollectionStore<A> {
        &self.saved
    }

    /// Mutable access to the saved-collection store
    pub fn saved_mut(&mut self) -> &mut SavedCollectionStore<A> {
        &mut self.saved
    }

    /// Active scope as (query, filters, tab)
    pub fn scope(&self) -> (&SearchQuery, &Filters, Tab) {
        (&self.query, &self.filters, self.tab)
    }

    /// Category vocabulary fetched at startup
    pub fn available_categories(&self) -> &[String] {
        &self.available_categories
    }

    /// Affiliation list fetched at startup
    pub fn available_affiliations(&self) -> &[String] {
        &self.available_affiliations
    }

    /// Whether the session is currently treated as authenticated
    pub fn is_logged_in(&self) -> bool {
        self.logged_in
    }

    /// Mark the session authenticated (after a successful login)
    pub fn set_logged_in(&mut self, logged_in: bool) {
        self.logged_in = logged_in;
    }

    /// Load the category and affiliation vocabularies.
    ///
    /// Read failures leave the previous vocabularies intact.
    pub async fn load_catalogs(&mut self) -> Result<(), ApiError> {
        self.available_categories = self.api.categories().await?;
        self.available_affiliations = self.api.organizations().await?;
        Ok(())
    }

    /// Fetch the first page of the current scope.
    pub async fn refresh(&mut self) {
        let fetch = self.engine.restart();
        run_page_fetch(self.api.as_ref(), &mut self.engine, fetch).await;
    }

    /// Fetch the next page of the current scope; a no-op while loading or
    /// after exhaustion.
    pub async fn load_more(&mut self) {
        if let Some(fetch) = self.engine.load_more() {
            run_page_fetch(self.api.as_ref(), &mut self.engine, fetch).await;
        }
    }

    /// Replace the whole scope without issuing a fetch; pair with
    /// [`refresh`](Self::refresh). Intents that change one axis at a time
    /// use the `set_*` methods instead.
    pub fn set_scope(&mut self, query: SearchQuery, filters: Filters, tab: Tab) {
        self.query = query.clone();
        self.filters = filters.clone();
        self.tab = tab;
        self.engine = PaginationEngine::new(query, filters, tab);
    }

    /// Replace the text query and reset the stream.
    pub async fn set_query(&mut self, query: SearchQuery) {
        self.query = query;
        self.reset_stream().await;
    }

    /// Replace the time window and reset the stream.
    pub async fn set_time_filter(&mut self, time: TimeWindow) {
        self.filters.time = time;
        self.reset_stream().await;
    }

    /// Replace the category set and reset the stream.
    pub async fn set_category_filter(&mut self, categories: BTreeSet<String>) {
        self.filters.categories = categories;
        self.reset_stream().await;
    }

    /// Replace the affiliation set and reset the stream.
    pub async fn set_affiliation_filter(&mut self, affiliations: BTreeSet<String>) {
        self.filters.affiliations = affiliations;
        self.reset_stream().await;
    }

    /// Switch tabs. `custom` drives the saved-collection store instead of
    /// the live stream; the others reset the live stream.
    pub async fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
        if tab == Tab::Custom {
            if let Err(err) = self.saved.list().await {
                tracing::warn!(error = %err, "saved collection list failed");
            }
        } else {
            self.reset_stream().await;
        }
    }

    /// Persist the currently active query/filters as a saved collection.
    pub async fn save_current(&mut self, description: &str) -> Result<(), ApiError> {
        let query = self.query.clone();
        let filters = self.filters.clone();
        self.saved.add(description, &query, &filters).await
    }

    /// Toggle a paper's favorite flag.
    ///
    /// Nothing changes locally until the server confirms; on confirmation
    /// the flag is updated in place wherever that paper is rendered (live
    /// stream and every saved panel). A 403 forces the logged-out state.
    pub async fn toggle_favorite(&mut self, paper_id: &str, favorite: bool) -> Result<(), ApiError> {
        let result = if favorite {
            self.api.add_favorite(paper_id).await
        } else {
            self.api.remove_favorite(paper_id).await
        };

        match result {
            Ok(()) => {
                self.engine.set_favorite(paper_id, favorite);
                self.saved.set_favorite(paper_id, favorite);
                Ok(())
            }
            Err(err) => {
                if err.is_unauthorized() {
                    self.force_logged_out().await;
                }
                Err(err)
            }
        }
    }

    /// Apply the logged-out transition: notify the gate, drop saved-set
    /// state, and pull any authenticated-only stream back to the public
    /// scope.
    pub async fn force_logged_out(&mut self) {
        tracing::info!("session no longer authorized; logging out");
        self.gate.force_logout();
        self.logged_in = false;
        self.saved.clear();
        if self.tab.requires_login() {
            self.tab = Tab::All;
            self.filters = Filters::default();
            self.query = SearchQuery::default();
            self.reset_stream().await;
        }
    }

    async fn reset_stream(&mut self) {
        let fetch = self
            .engine
            .reset(self.query.clone(), self.filters.clone(), self.tab);
        run_page_fetch(self.api.as_ref(), &mut self.engine, fetch).await;
    }
}
