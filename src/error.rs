//! Error types for the search, note-generation, and render boundaries.
//!
//! Each component returns its own typed error so the surfaces (CLI and HTTP)
//! can tell a usage problem from a collaborator outage or a layout fault.
//! "No chapters found" is not an error; it is an empty result.

use thiserror::Error;

/// Rejected search input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("query must not be empty")]
    EmptyQuery,
}

/// Failure talking to the note generator.
#[derive(Debug, Error)]
pub enum NotesError {
    #[error("note generation is disabled; set [notes] provider in config")]
    Disabled,

    #[error("no API key: pass one explicitly or set {0}")]
    MissingApiKey(String),

    #[error("no chapter text to synthesize notes from")]
    NoContext,

    #[error("note generator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("note generator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed note generator response: {0}")]
    MalformedResponse(String),
}

/// Fault inside the PDF layout engine.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode page content: {0}")]
    Content(String),

    #[error("failed to serialize PDF: {0}")]
    Serialize(String),
}
