//! Progress reporting for long-running commands.
//!
//! Note synthesis waits on a remote service with no fixed latency, so the CLI
//! tells the user what it is doing while it waits. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Searching the corpus for a concept.
    Searching { query: String },
    /// Waiting on the note generator with this many chapters of context.
    Synthesizing { query: String, chapters: usize },
    /// Laying out the PDF.
    Rendering { title: String },
}

/// Reports progress. Implementations write to stderr (human or JSON).
pub trait Progress: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Human-friendly progress on stderr: "synthesizing  'Money Bill' from 4 chapters...".
pub struct StderrProgress;

impl Progress for StderrProgress {
    fn report(&self, event: ProgressEvent) {
        let line = match &event {
            ProgressEvent::Searching { query } => format!("searching  '{}'...\n", query),
            ProgressEvent::Synthesizing { query, chapters } => format!(
                "synthesizing  '{}' from {} {}...\n",
                query,
                chapters,
                if *chapters == 1 { "chapter" } else { "chapters" }
            ),
            ProgressEvent::Rendering { title } => format!("rendering  '{}'...\n", title),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl Progress for JsonProgress {
    fn report(&self, event: ProgressEvent) {
        let obj = match &event {
            ProgressEvent::Searching { query } => serde_json::json!({
                "event": "progress",
                "phase": "searching",
                "query": query
            }),
            ProgressEvent::Synthesizing { query, chapters } => serde_json::json!({
                "event": "progress",
                "phase": "synthesizing",
                "query": query,
                "chapters": chapters
            }),
            ProgressEvent::Rendering { title } => serde_json::json!({
                "event": "progress",
                "phase": "rendering",
                "title": title
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl Progress for NoProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "off" => Some(ProgressMode::Off),
            "human" => Some(ProgressMode::Human),
            "json" => Some(ProgressMode::Json),
            _ => None,
        }
    }

    pub fn reporter(&self) -> Box<dyn Progress> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
