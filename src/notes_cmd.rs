use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::corpus::CorpusSource;
use crate::error::SearchError;
use crate::export;
use crate::notes;
use crate::progress::{Progress, ProgressEvent};
use crate::search::{self, SearchOptions};

/// Search, show the matches, then synthesize notes and optionally export them.
///
/// The search listing is printed before the generator is called, so a failed
/// generation still leaves the matches on screen.
pub async fn run_notes(
    config: &Config,
    query: &str,
    corpus: Option<PathBuf>,
    api_key: Option<String>,
    pdf: Option<PathBuf>,
    progress: &dyn Progress,
) -> Result<()> {
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
    let results = search::search_concepts(&document, query, &options)?;
    search::print_results(query, &results, config.search.snippet_limit);
    if results.is_empty() {
        return Ok(());
    }

    let generator = notes::create_generator(&config.notes, api_key)?;
    progress.report(ProgressEvent::Synthesizing {
        query: query.to_string(),
        chapters: results.len().min(config.notes.max_chapters),
    });
    let text = match notes::generate_notes(generator.as_ref(), query, &results, &config.notes).await
    {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, "note generation failed");
            return Err(e.into());
        }
    };

    println!("--- Notes ---");
    println!("{}", text.trim_end());

    if let Some(path) = pdf {
        export::export_pdf(&text, query, &path, &config.render, progress)?;
    }

    Ok(())
}
