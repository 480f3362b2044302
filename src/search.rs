//! Concept search across chapters.
//!
//! Matching is a case-insensitive *literal* substring test. The query is never
//! compiled into a pattern, so `a.b` or `(x)` only match their literal text.
//!
//! Two entry points:
//!
//! - [`search`] is the pure engine. It is total: a blank query returns no
//!   results.
//! - [`search_concepts`] is the boundary used by the CLI and HTTP server. It
//!   rejects a blank query with [`SearchError::EmptyQuery`] before searching.

use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::chapter;
use crate::config::Config;
use crate::corpus::CorpusSource;
use crate::error::SearchError;
use crate::models::SearchResult;
use crate::progress::{Progress, ProgressEvent};

/// Lines starting with this character are never collected as matches.
pub const COMMENT_MARKER: char = '#';

/// Request-scoped search options.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Keep only the first N matching chapters.
    pub max_results: Option<usize>,
}

/// Find every chapter of `document` that mentions `query`.
///
/// Results come back in chapter order. A chapter whose text contains the
/// query only across a line break (so no single line matches) is skipped.
pub fn search(document: &str, query: &str) -> Vec<SearchResult> {
    if query.trim().is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();

    chapter::split_chapters(document)
        .into_iter()
        .filter(|candidate| candidate.to_lowercase().contains(&needle))
        .filter_map(|candidate| {
            let matching_lines = matching_lines(candidate, &needle);
            if matching_lines.is_empty() {
                return None;
            }
            Some(SearchResult {
                title: chapter::chapter_title(candidate),
                body: candidate.trim().to_string(),
                matching_lines,
            })
        })
        .collect()
}

/// Lines of `chapter` containing the already-lowercased `needle`, trimmed.
fn matching_lines(chapter: &str, needle: &str) -> Vec<String> {
    chapter
        .lines()
        .filter(|line| !line.starts_with(COMMENT_MARKER))
        .filter(|line| line.to_lowercase().contains(needle))
        .map(|line| line.trim().to_string())
        .collect()
}

/// Validate the query, then search.
pub fn search_concepts(
    document: &str,
    query: &str,
    options: &SearchOptions,
) -> Result<Vec<SearchResult>, SearchError> {
    if query.trim().is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    let mut results = search(document, query);
    if let Some(max) = options.max_results {
        results.truncate(max);
    }

    tracing::debug!(query, chapters = results.len(), "concept search");
    Ok(results)
}

#[derive(Serialize)]
struct SearchOutput<'a> {
    query: &'a str,
    results: &'a [SearchResult],
}

/// CLI entry point for `polity search`.
pub fn run_search(
    config: &Config,
    query: &str,
    corpus: Option<PathBuf>,
    format: &str,
    progress: &dyn Progress,
) -> Result<()> {
    match format {
        "text" | "json" => {}
        other => anyhow::bail!("Unknown output format: {}. Use text or json.", other),
    }

    if query.trim().is_empty() {
        return Err(SearchError::EmptyQuery.into());
    }

    let source = CorpusSource::select(corpus, config.corpus.path.clone());
    let document = source.load()?;

    progress.report(ProgressEvent::Searching {
        query: query.to_string(),
    });
    let options = SearchOptions {
        max_results: config.search.max_results,
    };
    let results = search_concepts(&document, query, &options)?;

    if format == "json" {
        let out = SearchOutput {
            query,
            results: &results,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    print_results(query, &results, config.search.snippet_limit);
    Ok(())
}

/// Print the human-readable result listing shared by `search` and `notes`.
pub fn print_results(query: &str, results: &[SearchResult], snippet_limit: usize) {
    if results.is_empty() {
        println!("No mentions found for '{}' in the current material.", query);
        return;
    }

    println!("Found '{}' in {} contexts", query, results.len());
    println!();
    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.title);
        for line in result.preview(snippet_limit) {
            println!("    - {}", line);
        }
        if result.matching_lines.len() > snippet_limit {
            println!("    ...");
        }
        println!();
    }
}
