//! Paper model matching the corpus service's wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single author entry as returned by the papers endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    /// Author display name
    pub name: String,
}

impl Author {
    /// Create an author from a display name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// A paper record from the corpus service.
///
/// Papers are owned by the pagination engine that fetched them and are
/// immutable once appended, with one exception: the `favorite` flag may be
/// updated in place by id after a confirmed server round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    /// Corpus identifier (arXiv-style, e.g. "2301.12345")
    pub id: String,

    /// Submission time as a unix timestamp (seconds)
    pub created: i64,

    /// Paper title
    pub title: String,

    /// Abstract text
    pub r#abstract: String,

    /// Authors in publication order
    pub authors: Vec<Author>,

    /// Digital Object Identifier
    #[serde(default)]
    pub doi: Option<String>,

    /// Journal reference, when published outside the preprint server
    #[serde(default)]
    pub journal_ref: Option<String>,

    /// Primary category; always a member of `categories`
    pub primary_category: String,

    /// All categories, primary first
    pub categories: Vec<String>,

    /// Affiliations attached to the paper, in corpus order
    #[serde(default)]
    pub affiliations: Vec<String>,

    /// Whether the logged-in user has bookmarked this paper.
    /// Absent from the payload for anonymous sessions.
    #[serde(default)]
    pub favorite: bool,
}

impl Paper {
    /// Submission time as a UTC datetime, if the timestamp is representable
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.created, 0)
    }

    /// Author names joined for display
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Categories other than the primary one, in corpus order
    pub fn secondary_categories(&self) -> Vec<&str> {
        self.categories
            .iter()
            .map(String::as_str)
            .filter(|c| *c != self.primary_category)
            .collect()
    }

    /// Canonical PDF URL on the upstream preprint server
    pub fn pdf_url(&self) -> String {
        format!("https://arxiv.org/pdf/{}", self.id)
    }
}

/// Builder for constructing Paper values in tests and mocks.
#[derive(Debug, Clone)]
pub struct PaperBuilder {
    paper: Paper,
}

impl PaperBuilder {
    /// Create a builder with the required fields
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        primary_category: impl Into<String>,
    ) -> Self {
        let primary_category = primary_category.into();
        Self {
            paper: Paper {
                id: id.into(),
                created: 0,
                title: title.into(),
                r#abstract: String::new(),
                authors: Vec::new(),
                doi: None,
                journal_ref: None,
                categories: vec![primary_category.clone()],
                primary_category,
                affiliations: Vec::new(),
                favorite: false,
            },
        }
    }

    /// Set the submission timestamp
    pub fn created(mut self, created: i64) -> Self {
        self.paper.created = created;
        self
    }

    /// Set the abstract text
    pub fn abstract_text(mut self, text: impl Into<String>) -> Self {
        self.paper.r#abstract = text.into();
        self
    }

    /// Append an author
    pub fn author(mut self, name: impl Into<String>) -> Self {
        self.paper.authors.push(Author::new(name));
        self
    }

    /// Set the DOI
    pub fn doi(mut self, doi: impl Into<String>) -> Self {
        self.paper.doi = Some(doi.into());
        self
    }

    /// Set the journal reference
    pub fn journal_ref(mut self, journal_ref: impl Into<String>) -> Self {
        self.paper.journal_ref = Some(journal_ref.into());
        self
    }

    /// Append a secondary category
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.paper.categories.push(category.into());
        self
    }

    /// Append an affiliation
    pub fn affiliation(mut self, affiliation: impl Into<String>) -> Self {
        self.paper.affiliations.push(affiliation.into());
        self
    }

    /// Set the favorite flag
    pub fn favorite(mut self, favorite: bool) -> Self {
        self.paper.favorite = favorite;
        self
    }

    /// Build the Paper
    pub fn build(self) -> Paper {
        self.paper
    }
}
