//! Incremental pagination engine for one result stream.
//!
//! The engine is a plain state machine: callers ask it for the next fetch to
//! issue ([`PaginationEngine::reset`], [`PaginationEngine::load_more`]) and
//! report completions back ([`PaginationEngine::apply_page`],
//! [`PaginationEngine::apply_error`]) tagged with the generation token the
//! fetch was issued under. The transport gives no ordering guarantee across
//! completions; the generation check is what keeps stale responses out.
//!
//! Cancellation is logical: a reset bumps the generation, and the eventual
//! completion of any earlier fetch is discarded on arrival.

use crate::models::{Filters, Paper, SearchQuery, Tab};
use crate::query::{compose, RequestParams};

/// Engine phase. `Loading` guards against duplicate concurrent requests;
/// `Error` preserves accumulated items and clears on the next operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Error,
}

/// A fetch the caller must issue, tagged with the generation that must still
/// be current when its completion is applied.
#[derive(Debug, Clone)]
pub struct PageFetch {
    /// Generation token at issue time
    pub generation: u64,

    /// Composed request parameters
    pub params: RequestParams,
}

/// Outcome of applying a completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// The completion matched the current generation and was applied
    Current,
    /// The completion belonged to an earlier generation and was discarded
    Stale,
}

/// State machine for one incrementally-loaded result stream.
///
/// Owns the accumulated papers. Items only grow by append, and only from a
/// completion whose generation matches the engine's current generation at
/// application time.
#[derive(Debug, Clone)]
pub struct PaginationEngine {
    query: SearchQuery,
    filters: Filters,
    tab: Tab,
    items: Vec<Paper>,
    offset: usize,
    exhausted: bool,
    generation: u64,
    phase: Phase,
}

impl PaginationEngine {
    /// Create an engine for the given scope. No fetch is issued; the stream
    /// stays uninitialized until the first [`reset`](Self::reset) or
    /// [`restart`](Self::restart).
    pub fn new(query: SearchQuery, filters: Filters, tab: Tab) -> Self {
        Self {
            query,
            filters,
            tab,
            items: Vec::new(),
            offset: 0,
            exhausted: false,
            generation: 0,
            phase: Phase::Idle,
        }
    }

    /// Accumulated papers, in arrival order
    pub fn items(&self) -> &[Paper] {
        &self.items
    }

    /// Next fetch offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the stream has reported its empty terminal page
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Current generation token
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a fetch is outstanding
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }

    /// Whether the stream has never issued a fetch
    pub fn is_untouched(&self) -> bool {
        self.generation == 0
    }

    /// The scope this engine paginates
    pub fn scope(&self) -> (&SearchQuery, &Filters, Tab) {
        (&self.query, &self.filters, self.tab)
    }

    /// Point the stream at a new scope and start over.
    ///
    /// Increments the generation (invalidating every outstanding fetch),
    /// clears the accumulated items, and returns the offset-0 fetch to
    /// issue. A reset always wins over in-flight work.
    pub fn reset(&mut self, query: SearchQuery, filters: Filters, tab: Tab) -> PageFetch {
        self.query = query;
        self.filters = filters;
        self.tab = tab;
        self.restart()
    }

    /// Start the stream over under the current scope.
    pub fn restart(&mut self) -> PageFetch {
        self.generation += 1;
        self.items.clear();
        self.offset = 0;
        self.exhausted = false;
        self.phase = Phase::Loading;
        tracing::debug!(generation = self.generation, tab = %self.tab, "stream reset");
        PageFetch {
            generation: self.generation,
            params: compose(&self.query, &self.filters, self.tab, 0),
        }
    }

    /// Request the next page.
    ///
    /// Returns `None` while a fetch is outstanding or once the stream is
    /// exhausted; both cases are idempotent no-ops. Callable from the error
    /// phase, which it clears.
    pub fn load_more(&mut self) -> Option<PageFetch> {
        if self.exhausted || self.phase == Phase::Loading {
            return None;
        }
        self.phase = Phase::Loading;
        let offset = self.items.len();
        self.offset = offset;
        Some(PageFetch {
            generation: self.generation,
            params: compose(&self.query, &self.filters, self.tab, offset),
        })
    }

    /// Apply a successful page completion issued under `generation`.
    ///
    /// A stale generation is discarded unconditionally. Otherwise the papers
    /// are appended (never reordered), the offset advances, and exhaustion
    /// is inferred from an empty page.
    pub fn apply_page(&mut self, generation: u64, papers: Vec<Paper>) -> Applied {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "discarding stale page"
            );
            return Applied::Stale;
        }
        self.exhausted = papers.is_empty();
        self.items.extend(papers);
        self.offset = self.items.len();
        self.phase = Phase::Idle;
        Applied::Current
    }

    /// Apply a failed completion issued under `generation`.
    ///
    /// Stale failures are discarded like stale pages. A current failure
    /// moves the engine to the error phase, preserving items and leaving
    /// `exhausted` untouched.
    pub fn apply_error(&mut self, generation: u64) -> Applied {
        if generation != self.generation {
            return Applied::Stale;
        }
        self.phase = Phase::Error;
        Applied::Current
    }

    /// Update the favorite flag of the paper with `id`, in place.
    ///
    /// This is the one sanctioned out-of-band mutation: ordering and
    /// identity of `items` are untouched. Returns whether a paper matched.
    pub fn set_favorite(&mut self, id: &str, favorite: bool) -> bool {
        match self.items.iter_mut().find(|p| p.id == id) {
            Some(paper) => {
                paper.favorite = favorite;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::make_papers;
    use crate::models::TimeWindow;

    fn engine() -> PaginationEngine {
        PaginationEngine::new(
            SearchQuery::default(),
            Filters::for_window(TimeWindow::LastDay),
            Tab::All,
        )
    }

    #[test]
    fn test_reset_starts_at_offset_zero() {
        let mut engine = engine();
        let fetch = engine.restart();

        assert_eq!(fetch.generation, 1);
        assert_eq!(fetch.params.offset(), 0);
        assert_eq!(engine.phase(), Phase::Loading);
        assert!(!engine.is_exhausted());
    }

    #[test]
    fn test_page_appends_and_advances_offset() {
        let mut engine = engine();
        let fetch = engine.restart();

        let applied = engine.apply_page(fetch.generation, make_papers("2401", 20));
        assert_eq!(applied, Applied::Current);
        assert_eq!(engine.items().len(), 20);
        assert_eq!(engine.offset(), 20);
        assert!(!engine.is_exhausted());
        assert_eq!(engine.phase(), Phase::Idle);

        let next = engine.load_more().expect("not exhausted");
        assert_eq!(next.params.offset(), 20);
    }

    #[test]
    fn test_empty_page_exhausts_stream() {
        let mut engine = engine();
        let fetch = engine.restart();
        engine.apply_page(fetch.generation, make_papers("2401", 20));

        let next = engine.load_more().unwrap();
        engine.apply_page(next.generation, Vec::new());

        assert!(engine.is_exhausted());
        assert_eq!(engine.items().len(), 20);
        assert!(engine.load_more().is_none());
    }

    #[test]
    fn test_load_more_is_noop_while_loading() {
        let mut engine = engine();
        let _ = engine.restart();

        // Fetch outstanding: repeated load_more must not issue duplicates
        assert!(engine.load_more().is_none());
        assert!(engine.load_more().is_none());
    }

    #[test]
    fn test_stale_generation_is_discarded() {
        let mut engine = engine();
        let first = engine.restart();
        let second = engine.reset(
            SearchQuery::full_text("quantum"),
            Filters::for_window(TimeWindow::LastWeek),
            Tab::All,
        );

        // The first fetch completes late; its generation lost
        assert_eq!(
            engine.apply_page(first.generation, make_papers("stale", 7)),
            Applied::Stale
        );
        assert!(engine.items().is_empty());
        assert_eq!(engine.phase(), Phase::Loading);

        assert_eq!(
            engine.apply_page(second.generation, make_papers("fresh", 3)),
            Applied::Current
        );
        assert_eq!(engine.items().len(), 3);
        assert!(engine.items().iter().all(|p| p.id.starts_with("fresh")));
    }

    #[test]
    fn test_interleaved_resets_only_latest_applies() {
        let mut engine = engine();
        let mut fetches = Vec::new();
        for _ in 0..5 {
            fetches.push(engine.restart());
        }

        // Completions arrive in reverse order; only generation 5 may land
        for fetch in fetches.iter().rev() {
            engine.apply_page(fetch.generation, make_papers("p", 2));
        }
        assert_eq!(engine.items().len(), 2);
        assert_eq!(engine.generation(), 5);
    }

    #[test]
    fn test_error_preserves_items_and_exhaustion() {
        let mut engine = engine();
        let fetch = engine.restart();
        engine.apply_page(fetch.generation, make_papers("2401", 20));

        let next = engine.load_more().unwrap();
        assert_eq!(engine.apply_error(next.generation), Applied::Current);

        assert_eq!(engine.phase(), Phase::Error);
        assert_eq!(engine.items().len(), 20);
        assert!(!engine.is_exhausted());
    }

    #[test]
    fn test_load_more_clears_error_phase() {
        let mut engine = engine();
        let fetch = engine.restart();
        engine.apply_error(fetch.generation);

        let retry = engine.load_more().expect("error phase is retryable");
        assert_eq!(retry.params.offset(), 0);
        assert_eq!(engine.phase(), Phase::Loading);
    }

    #[test]
    fn test_stale_error_does_not_clobber_new_generation() {
        let mut engine = engine();
        let first = engine.restart();
        let second = engine.restart();

        assert_eq!(engine.apply_error(first.generation), Applied::Stale);
        assert_eq!(engine.phase(), Phase::Loading);

        engine.apply_page(second.generation, make_papers("ok", 1));
        assert_eq!(engine.phase(), Phase::Idle);
    }

    #[test]
    fn test_set_favorite_updates_in_place() {
        let mut engine = engine();
        let fetch = engine.restart();
        engine.apply_page(fetch.generation, make_papers("2401", 3));

        let ids: Vec<String> = engine.items().iter().map(|p| p.id.clone()).collect();
        assert!(engine.set_favorite("2401.00001", true));
        assert!(!engine.set_favorite("9999.00000", true));

        let after: Vec<String> = engine.items().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, after);
        assert!(engine.items()[1].favorite);
        assert!(!engine.items()[0].favorite);
    }

    #[test]
    fn test_reset_clears_exhaustion() {
        let mut engine = engine();
        let fetch = engine.restart();
        engine.apply_page(fetch.generation, Vec::new());
        assert!(engine.is_exhausted());

        let fetch = engine.restart();
        assert!(!engine.is_exhausted());
        engine.apply_page(fetch.generation, make_papers("new", 4));
        assert_eq!(engine.items().len(), 4);
    }
}
