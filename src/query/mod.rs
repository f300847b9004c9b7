//! Canonical request composition for the papers endpoint.
//!
//! [`compose`] is the single place where UI state (query, filters, tab)
//! turns into request parameters. It is pure and deterministic: identical
//! inputs always produce a byte-identical query string, which is what makes
//! request-level caching and the tests in this module possible.

use crate::models::{Filters, SearchQuery, Tab};

/// Canonical parameters for one page fetch.
///
/// Holds the already-joined filter axes; [`RequestParams::query_string`]
/// renders them in a fixed order with percent-encoded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestParams {
    offset: usize,
    time: &'static str,
    tab: &'static str,
    query: Option<(String, &'static str)>,
    affiliations: Option<String>,
    categories: Option<String>,
    similar_id: Option<String>,
}

impl RequestParams {
    /// The offset this request was composed for
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Render the canonical query string.
    ///
    /// Parameter order is fixed: `offset`, `time`, `tab`, then
    /// `query`/`query_type`, `affiliations`, `categories`, `similar_id`,
    /// each present only when the corresponding axis is non-empty.
    pub fn query_string(&self) -> String {
        let mut out = format!("offset={}&time={}&tab={}", self.offset, self.time, self.tab);

        if let Some((value, kind)) = &self.query {
            out.push_str("&query=");
            out.push_str(&urlencoding::encode(value));
            out.push_str("&query_type=");
            out.push_str(kind);
        }
        if let Some(affiliations) = &self.affiliations {
            out.push_str("&affiliations=");
            out.push_str(&urlencoding::encode(affiliations));
        }
        if let Some(categories) = &self.categories {
            out.push_str("&categories=");
            out.push_str(&urlencoding::encode(categories));
        }
        if let Some(similar_id) = &self.similar_id {
            out.push_str("&similar_id=");
            out.push_str(&urlencoding::encode(similar_id));
        }

        out
    }
}

/// Compose canonical request parameters from the active query, filters, and
/// tab.
///
/// Empty axes are omitted: a query with no text contributes neither `query`
/// nor `query_type`, and empty category/affiliation sets contribute nothing
/// for their axis. `offset` and `time` and `tab` are always present.
pub fn compose(query: &SearchQuery, filters: &Filters, tab: Tab, offset: usize) -> RequestParams {
    RequestParams {
        offset,
        time: filters.time.as_str(),
        tab: tab.as_str(),
        query: (!query.is_empty()).then(|| (query.value.clone(), query.kind.as_str())),
        affiliations: join_axis(&filters.affiliations),
        categories: join_axis(&filters.categories),
        similar_id: None,
    }
}

/// Compose parameters for a related-papers lookup.
///
/// The service treats `similar_id` as an alternative to a text query: the
/// filters and tab still apply, the text query does not.
pub fn compose_similar(
    paper_id: &str,
    filters: &Filters,
    tab: Tab,
    offset: usize,
) -> RequestParams {
    RequestParams {
        offset,
        time: filters.time.as_str(),
        tab: tab.as_str(),
        query: None,
        affiliations: join_axis(&filters.affiliations),
        categories: join_axis(&filters.categories),
        similar_id: Some(paper_id.to_string()),
    }
}

fn join_axis(set: &std::collections::BTreeSet<String>) -> Option<String> {
    if set.is_empty() {
        None
    } else {
        Some(set.iter().cloned().collect::<Vec<_>>().join(","))
    }
}
