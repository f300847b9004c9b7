//! Query, filter, and saved-collection models.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// How the free-text query is matched by the corpus service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    FullText,
    Author,
}

impl SearchType {
    /// Wire identifier of this search type
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchType::FullText => "full_text",
            SearchType::Author => "author",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SearchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full_text" => Ok(SearchType::FullText),
            "author" => Ok(SearchType::Author),
            other => Err(format!("unknown search type: {other}")),
        }
    }
}

/// Free-text search query.
///
/// An empty `value` means "no text filter"; the composer omits the query
/// parameters entirely in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text
    pub value: String,

    /// Match mode
    #[serde(rename = "type")]
    pub kind: SearchType,
}

impl SearchQuery {
    /// Create a full-text query
    pub fn full_text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: SearchType::FullText,
        }
    }

    /// Create an author query
    pub fn author(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            kind: SearchType::Author,
        }
    }

    /// Whether this query carries no text filter
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            value: String::new(),
            kind: SearchType::FullText,
        }
    }
}

/// Time window restricting results to recent submission periods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    LastDay,
    LastThreeDays,
    LastWeek,
    LastFourWeeks,
    LastSixMonths,
    LastYear,
    AllTime,
}

impl TimeWindow {
    /// Wire identifier of this window
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::LastDay => "last_day",
            TimeWindow::LastThreeDays => "last_three_days",
            TimeWindow::LastWeek => "last_week",
            TimeWindow::LastFourWeeks => "last_four_weeks",
            TimeWindow::LastSixMonths => "last_six_months",
            TimeWindow::LastYear => "last_year",
            TimeWindow::AllTime => "all_time",
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "last_day" => Ok(TimeWindow::LastDay),
            "last_three_days" => Ok(TimeWindow::LastThreeDays),
            "last_week" => Ok(TimeWindow::LastWeek),
            "last_four_weeks" => Ok(TimeWindow::LastFourWeeks),
            "last_six_months" => Ok(TimeWindow::LastSixMonths),
            "last_year" => Ok(TimeWindow::LastYear),
            "all_time" => Ok(TimeWindow::AllTime),
            other => Err(format!("unknown time window: {other}")),
        }
    }
}

/// Multi-dimensional result filters.
///
/// Category and affiliation sets are unordered with unique membership; an
/// empty set places no restriction on that axis. Ordered sets are used so
/// the comma-joined request parameters are deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    /// Submission-time window
    pub time: TimeWindow,

    /// Primary-category restriction
    #[serde(default)]
    pub categories: BTreeSet<String>,

    /// Affiliation restriction
    #[serde(default)]
    pub affiliations: BTreeSet<String>,
}

impl Filters {
    /// Filters restricted to a time window only
    pub fn for_window(time: TimeWindow) -> Self {
        Self {
            time,
            ..Self::default()
        }
    }

    /// Replace the category set
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the affiliation set
    pub fn with_affiliations<I, S>(mut self, affiliations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.affiliations = affiliations.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            time: TimeWindow::LastDay,
            categories: BTreeSet::new(),
            affiliations: BTreeSet::new(),
        }
    }
}

/// Top-level view selector determining which pagination streams are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    All,
    Favorites,
    Custom,
}

impl Tab {
    /// Wire identifier of this tab
    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::All => "all",
            Tab::Favorites => "favorites",
            Tab::Custom => "custom",
        }
    }

    /// Whether this tab only makes sense for an authenticated session
    pub fn requires_login(&self) -> bool {
        matches!(self, Tab::Favorites | Tab::Custom)
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Tab::All),
            "favorites" => Ok(Tab::Favorites),
            "custom" => Ok(Tab::Custom),
            other => Err(format!("unknown tab: {other}")),
        }
    }
}

/// A persisted, named (query, filters) pair with its own result stream.
///
/// The server owns the canonical list; the client replaces its copy
/// wholesale after every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedFilterCollection {
    /// Server-assigned identifier
    pub id: String,

    /// User-supplied description
    pub description: String,

    /// The saved text query
    pub query: SearchQuery,

    /// The saved filters
    pub filters: Filters,
}

/// Body of the save-collection request, in the flat shape the server expects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedQueryForm {
    /// User-supplied description
    pub description: String,

    /// Time window wire string
    pub time: TimeWindow,

    /// Query text
    pub search_string: String,

    /// Query match mode
    pub search_type: SearchType,

    /// Selected categories
    pub categories: Vec<String>,

    /// Selected affiliations
    pub affiliations: Vec<String>,
}

impl SavedQueryForm {
    /// Assemble the form from the currently active query and filters
    pub fn new(description: impl Into<String>, query: &SearchQuery, filters: &Filters) -> Self {
        Self {
            description: description.into(),
            time: filters.time,
            search_string: query.value.clone(),
            search_type: query.kind,
            categories: filters.categories.iter().cloned().collect(),
            affiliations: filters.affiliations.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_window_round_trip() {
        for window in [
            TimeWindow::LastDay,
            TimeWindow::LastThreeDays,
            TimeWindow::LastWeek,
            TimeWindow::LastFourWeeks,
            TimeWindow::LastSixMonths,
            TimeWindow::LastYear,
            TimeWindow::AllTime,
        ] {
            assert_eq!(window.as_str().parse::<TimeWindow>().unwrap(), window);
        }
    }

    #[test]
    fn test_saved_collection_deserializes_wire_payload() {
        let json = r#"{
            "id": "b2f6d9f0",
            "description": "quantum ML",
            "query": {"value": "quantum", "type": "full_text"},
            "filters": {
                "time": "last_week",
                "categories": ["cs.LG", "quant-ph"],
                "affiliations": []
            }
        }"#;

        let saved: SavedFilterCollection = serde_json::from_str(json).unwrap();
        assert_eq!(saved.query.kind, SearchType::FullText);
        assert_eq!(saved.filters.time, TimeWindow::LastWeek);
        assert!(saved.filters.categories.contains("quant-ph"));
    }

    #[test]
    fn test_saved_query_form_flattens_state() {
        let query = SearchQuery::author("Knuth");
        let filters = Filters::for_window(TimeWindow::LastYear)
            .with_categories(["cs.DS"])
            .with_affiliations(["Stanford"]);

        let form = SavedQueryForm::new("classic algorithms", &query, &filters);
        let body = serde_json::to_value(&form).unwrap();

        assert_eq!(body["search_string"], "Knuth");
        assert_eq!(body["search_type"], "author");
        assert_eq!(body["time"], "last_year");
        assert_eq!(body["categories"][0], "cs.DS");
    }

    #[test]
    fn test_empty_query_has_no_text_filter() {
        assert!(SearchQuery::default().is_empty());
        assert!(!SearchQuery::full_text("quantum").is_empty());
    }
}
