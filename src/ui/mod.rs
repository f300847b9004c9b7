//! CLI output formatting for papers and saved collections.
//!
//! Colored cards for papers, tables for saved sets, and a loading spinner
//! for in-flight page fetches. All decoration is suppressed when stdout is
//! not a terminal.

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, ContentArrangement, Table};
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;

use crate::models::{Paper, SavedFilterCollection};

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Truncate text to `max_chars`, appending an ellipsis when cut.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// Format a unix timestamp for display.
pub fn format_timestamp(unix_secs: i64) -> String {
    chrono::DateTime::from_timestamp(unix_secs, 0)
        .map(|dt| dt.format("%a, %e %b %Y %H:%M UTC").to_string())
        .unwrap_or_else(|| unix_secs.to_string())
}

/// Print one paper as a card, mirroring the corpus web view.
pub fn print_paper_card(paper: &Paper) {
    let bookmark = if paper.favorite { "★" } else { " " };

    println!();
    if is_terminal() {
        println!("{} {}", bookmark.yellow(), paper.title.blue().bold());
    } else {
        println!("{} {}", bookmark, paper.title);
    }
    if !paper.affiliations.is_empty() {
        println!("  [{}]", paper.affiliations.join("] ["));
    }
    println!("  {}", paper.author_names());
    println!("  {}  {}", format_timestamp(paper.created), paper.pdf_url());
    if let Some(journal_ref) = &paper.journal_ref {
        println!("  {}", journal_ref);
    }
    if let Some(doi) = &paper.doi {
        println!("  doi:{}", doi);
    }

    let mut tags = vec![paper.primary_category.clone()];
    tags.extend(paper.secondary_categories().iter().map(|c| c.to_string()));
    if is_terminal() {
        println!("  {}", tags.join(" · ").green());
    } else {
        println!("  {}", tags.join(" · "));
    }
    println!("  {}", truncate_with_ellipsis(&paper.r#abstract, 400));
}

/// Print a run of papers with a trailing count line.
pub fn print_papers(papers: &[Paper]) {
    for paper in papers {
        print_paper_card(paper);
    }
    println!();
    if is_terminal() {
        println!("{} papers", papers.len().to_string().green().bold());
    } else {
        println!("{} papers", papers.len());
    }
}

/// Print saved collections as a table.
pub fn print_saved_table(collections: &[SavedFilterCollection]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Description", "Query", "Time", "Categories", "Affiliations", "Id"]);

    for (index, collection) in collections.iter().enumerate() {
        let query = if collection.query.is_empty() {
            String::new()
        } else {
            format!("{} ({})", collection.query.value, collection.query.kind)
        };
        table.add_row(vec![
            Cell::new(index),
            Cell::new(&collection.description),
            Cell::new(query),
            Cell::new(collection.filters.time.as_str()),
            Cell::new(
                collection
                    .filters
                    .categories
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Cell::new(
                collection
                    .filters
                    .affiliations
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            Cell::new(&collection.id),
        ]);
    }

    println!("{table}");
}

/// Print a simple name list (categories, organizations).
pub fn print_name_list(names: &[String]) {
    for name in names {
        println!("{name}");
    }
}

/// Spinner shown while a page fetch is outstanding.
///
/// Inert when stdout is not a terminal.
pub struct FetchSpinner {
    pb: Option<indicatif::ProgressBar>,
}

impl FetchSpinner {
    /// Start a spinner with `msg`
    pub fn new(msg: &str) -> Self {
        if !is_terminal() {
            return Self { pb: None };
        }
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .expect("static spinner template"),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb: Some(pb) }
    }

    /// Stop and erase the spinner
    pub fn finish(&self) {
        if let Some(pb) = &self.pb {
            pb.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("short", 10), "short");
        assert_eq!(truncate_with_ellipsis("a longer sentence", 9), "a long...");
    }

    #[test]
    fn test_format_timestamp() {
        let formatted = format_timestamp(1_617_235_200);
        assert!(formatted.contains("2021"));
        assert!(formatted.ends_with("UTC"));
    }
}
