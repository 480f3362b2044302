//! Core data models shared by the search engine and the surfaces.
//!
//! Nothing here is persisted. A [`SearchResult`] owns its strings so it can
//! outlive the corpus text it was cut from and be serialized to JSON.

use serde::Serialize;

/// One matching chapter returned by a concept search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub body: String,
    /// Trimmed lines mentioning the query, in document order.
    pub matching_lines: Vec<String>,
}

impl SearchResult {
    /// The first `limit` matching lines, for compact display.
    pub fn preview(&self, limit: usize) -> &[String] {
        &self.matching_lines[..self.matching_lines.len().min(limit)]
    }
}
