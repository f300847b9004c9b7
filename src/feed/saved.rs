//! Saved filter collections and their per-collection result streams.
//!
//! The server owns the canonical list. Every mutation (save, delete) is
//! followed by a wholesale re-list rather than a client-side patch, so the
//! local order always matches the server's. Each collection carries its own
//! [`PaginationEngine`]; a collection's stream is only started the first
//! time its panel expands.

use std::sync::Arc;

use crate::api::{ApiError, CorpusApi};
use crate::feed::expansion::{ExpansionCoordinator, Signal};
use crate::feed::pagination::PaginationEngine;
use crate::feed::run_page_fetch;
use crate::models::{Filters, SavedFilterCollection, SavedQueryForm, SearchQuery, Tab};
use crate::session::SessionGate;

/// One saved collection plus its ephemeral stream state.
#[derive(Debug, Clone)]
pub struct SavedEntry {
    /// The persisted (query, filters) pair
    pub collection: SavedFilterCollection,

    /// The collection's result stream
    pub engine: PaginationEngine,
}

impl SavedEntry {
    fn new(collection: SavedFilterCollection) -> Self {
        // Saved streams browse the whole corpus; the favorites/custom tabs
        // never apply inside a panel
        let engine = PaginationEngine::new(
            collection.query.clone(),
            collection.filters.clone(),
            Tab::All,
        );
        Self { collection, engine }
    }
}

/// The set of saved filter collections with expand/collapse coordination.
#[derive(Debug)]
pub struct SavedCollectionStore<A: CorpusApi> {
    api: Arc<A>,
    gate: Arc<dyn SessionGate>,
    entries: Vec<SavedEntry>,
    coordinator: ExpansionCoordinator,
}

impl<A: CorpusApi> SavedCollectionStore<A> {
    /// Create an empty store
    pub fn new(api: Arc<A>, gate: Arc<dyn SessionGate>) -> Self {
        Self {
            api,
            gate,
            entries: Vec::new(),
            coordinator: ExpansionCoordinator::new(0),
        }
    }

    /// Current entries in server order
    pub fn entries(&self) -> &[SavedEntry] {
        &self.entries
    }

    /// Expansion state over the current entries
    pub fn coordinator(&self) -> &ExpansionCoordinator {
        &self.coordinator
    }

    /// Refresh the list from the server, replacing local state wholesale.
    ///
    /// Every entry gets a fresh, uninitialized stream. Panels that were open
    /// stay open (by index); indices beyond the new length are pruned.
    pub async fn list(&mut self) -> Result<(), ApiError> {
        let collections = self.api.saved_collections().await?;
        tracing::debug!(count = collections.len(), "saved collections listed");
        self.entries = collections.into_iter().map(SavedEntry::new).collect();
        self.coordinator.resize(self.entries.len());

        // Re-fetch panels that are still open under the new list
        for index in self.coordinator.active_indices() {
            self.start_stream(index).await;
        }
        Ok(())
    }

    /// Persist the active query/filters as a new collection, then re-list.
    ///
    /// Local state is never updated optimistically; the new collection shows
    /// up only through the follow-up list.
    pub async fn add(
        &mut self,
        description: &str,
        query: &SearchQuery,
        filters: &Filters,
    ) -> Result<(), ApiError> {
        let form = SavedQueryForm::new(description, query, filters);
        if let Err(err) = self.api.save_collection(&form).await {
            return Err(self.gate_mutation(err));
        }
        self.list().await
    }

    /// Delete the collection at `index`, compact expansion state, re-list.
    pub async fn remove_at(&mut self, index: usize) -> Result<(), ApiError> {
        let Some(entry) = self.entries.get(index) else {
            return Ok(());
        };
        let query_id = entry.collection.id.clone();

        if let Err(err) = self.api.delete_collection(&query_id).await {
            return Err(self.gate_mutation(err));
        }

        self.coordinator.on_delete(index);
        self.entries.remove(index);
        self.list().await
    }

    /// Toggle panel `index`; the first expansion starts its stream.
    ///
    /// Returns the derived global signal when the toggle makes the set full
    /// or empty.
    pub async fn toggle(&mut self, index: usize) -> Option<Signal> {
        let signal = self.coordinator.toggle(index);
        if self.coordinator.is_active(index) {
            self.start_stream(index).await;
        }
        signal
    }

    /// Apply the global expand-all/collapse-all affordance.
    pub async fn set_all(&mut self, expand: bool) {
        self.coordinator.set_all(expand);
        if expand {
            for index in 0..self.entries.len() {
                self.start_stream(index).await;
            }
        }
    }

    /// Load the next page of the stream at `index`.
    pub async fn load_more_at(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            if let Some(fetch) = entry.engine.load_more() {
                run_page_fetch(self.api.as_ref(), &mut entry.engine, fetch).await;
            }
        }
    }

    /// Propagate a confirmed favorite change into every panel's items.
    pub fn set_favorite(&mut self, paper_id: &str, favorite: bool) {
        for entry in &mut self.entries {
            entry.engine.set_favorite(paper_id, favorite);
        }
    }

    /// Drop all local state (logged-out transition).
    pub fn clear(&mut self) {
        self.entries.clear();
        self.coordinator.resize(0);
    }

    async fn start_stream(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            if entry.engine.is_untouched() {
                let fetch = entry.engine.restart();
                run_page_fetch(self.api.as_ref(), &mut entry.engine, fetch).await;
            }
        }
    }

    /// Forward a 403 on a mutation to the session gate and drop local
    /// authenticated state before surfacing the error.
    fn gate_mutation(&mut self, err: ApiError) -> ApiError {
        if err.is_unauthorized() {
            tracing::warn!("saved-collection mutation rejected; forcing logout");
            self.gate.force_logout();
            self.clear();
        }
        err
    }
}
