//! Scripted in-memory corpus client for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::api::{ApiError, CorpusApi, LoginStatus, PaperPage};
use crate::models::{Filters, Paper, PaperBuilder, SavedFilterCollection, SavedQueryForm, SearchQuery};
use crate::query::RequestParams;

/// A scripted response for the papers endpoint.
#[derive(Debug, Clone)]
enum PageScript {
    Page(Vec<Paper>),
    Status(u16),
    NetworkDown,
}

fn status_error(status: u16) -> ApiError {
    if status == 403 {
        ApiError::Unauthorized
    } else {
        ApiError::ServerRejected {
            status,
            message: String::new(),
        }
    }
}

/// A mock corpus service that replays scripted page responses and keeps an
/// in-memory saved-collection table.
#[derive(Debug, Default)]
pub struct MockCorpus {
    pages: Mutex<VecDeque<PageScript>>,
    requests: Mutex<Vec<String>>,
    saved: Mutex<Vec<SavedFilterCollection>>,
    next_saved_id: Mutex<u32>,
    mutation_status: Mutex<Option<u16>>,
    favorite_calls: Mutex<Vec<(String, bool)>>,
    categories: Mutex<Vec<String>>,
    organizations: Mutex<Vec<String>>,
}

impl MockCorpus {
    /// Create an empty mock
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a page of papers to return from the next fetch
    pub fn push_page(&self, papers: Vec<Paper>) {
        self.pages
            .lock()
            .unwrap()
            .push_back(PageScript::Page(papers));
    }

    /// Queue a non-200 status for the next fetch
    pub fn push_status(&self, status: u16) {
        self.pages
            .lock()
            .unwrap()
            .push_back(PageScript::Status(status));
    }

    /// Queue a transport failure for the next fetch
    pub fn push_network_failure(&self) {
        self.pages.lock().unwrap().push_back(PageScript::NetworkDown);
    }

    /// Fail every subsequent mutation with `status` (403 for auth tests)
    pub fn fail_mutations_with(&self, status: u16) {
        *self.mutation_status.lock().unwrap() = Some(status);
    }

    /// Stop failing mutations
    pub fn allow_mutations(&self) {
        *self.mutation_status.lock().unwrap() = None;
    }

    /// Seed the saved-collection table
    pub fn seed_saved(&self, collections: Vec<SavedFilterCollection>) {
        *self.saved.lock().unwrap() = collections;
    }

    /// Seed the category vocabulary
    pub fn seed_categories(&self, categories: Vec<String>) {
        *self.categories.lock().unwrap() = categories;
    }

    /// Seed the affiliation list
    pub fn seed_organizations(&self, organizations: Vec<String>) {
        *self.organizations.lock().unwrap() = organizations;
    }

    /// Query strings of every page fetch received, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Favorite mutations received as (paper_id, added)
    pub fn favorite_calls(&self) -> Vec<(String, bool)> {
        self.favorite_calls.lock().unwrap().clone()
    }

    fn mutation_gate(&self) -> Result<(), ApiError> {
        match *self.mutation_status.lock().unwrap() {
            Some(status) => Err(status_error(status)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CorpusApi for MockCorpus {
    async fn fetch_page(&self, params: &RequestParams) -> Result<PaperPage, ApiError> {
        self.requests.lock().unwrap().push(params.query_string());
        match self.pages.lock().unwrap().pop_front() {
            Some(PageScript::Page(papers)) => Ok(PaperPage {
                papers,
                cutoff: None,
            }),
            Some(PageScript::Status(status)) => Err(status_error(status)),
            Some(PageScript::NetworkDown) => {
                Err(ApiError::Network("connection refused".to_string()))
            }
            // An unscripted fetch reads as an exhausted stream
            None => Ok(PaperPage {
                papers: Vec::new(),
                cutoff: None,
            }),
        }
    }

    async fn categories(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.categories.lock().unwrap().clone())
    }

    async fn organizations(&self) -> Result<Vec<String>, ApiError> {
        Ok(self.organizations.lock().unwrap().clone())
    }

    async fn saved_collections(&self) -> Result<Vec<SavedFilterCollection>, ApiError> {
        Ok(self.saved.lock().unwrap().clone())
    }

    async fn save_collection(&self, form: &SavedQueryForm) -> Result<(), ApiError> {
        self.mutation_gate()?;
        let mut next_id = self.next_saved_id.lock().unwrap();
        *next_id += 1;
        let collection = SavedFilterCollection {
            id: format!("saved-{}", *next_id),
            description: form.description.clone(),
            query: SearchQuery {
                value: form.search_string.clone(),
                kind: form.search_type,
            },
            filters: Filters {
                time: form.time,
                categories: form.categories.iter().cloned().collect(),
                affiliations: form.affiliations.iter().cloned().collect(),
            },
        };
        self.saved.lock().unwrap().push(collection);
        Ok(())
    }

    async fn delete_collection(&self, query_id: &str) -> Result<(), ApiError> {
        self.mutation_gate()?;
        self.saved.lock().unwrap().retain(|c| c.id != query_id);
        Ok(())
    }

    async fn add_favorite(&self, paper_id: &str) -> Result<(), ApiError> {
        self.mutation_gate()?;
        self.favorite_calls
            .lock()
            .unwrap()
            .push((paper_id.to_string(), true));
        Ok(())
    }

    async fn remove_favorite(&self, paper_id: &str) -> Result<(), ApiError> {
        self.mutation_gate()?;
        self.favorite_calls
            .lock()
            .unwrap()
            .push((paper_id.to_string(), false));
        Ok(())
    }

    async fn login(&self, name: &str, _password: &str) -> Result<String, ApiError> {
        Ok(format!("session={name}"))
    }

    async fn login_check(&self) -> Result<LoginStatus, ApiError> {
        Ok(LoginStatus {
            logged_in: true,
            user: None,
        })
    }

    async fn logout(&self) -> Result<(), ApiError> {
        Ok(())
    }
}

/// Helper to build a minimal paper for tests.
pub fn make_paper(id: &str, title: &str) -> Paper {
    PaperBuilder::new(id, title, "cs.LG")
        .created(1_700_000_000)
        .author("Test Author")
        .build()
}

/// Helper to build a run of sequentially-numbered papers.
pub fn make_papers(prefix: &str, count: usize) -> Vec<Paper> {
    (0..count)
        .map(|i| make_paper(&format!("{prefix}.{i:05}"), &format!("Paper {i}")))
        .collect()
}
