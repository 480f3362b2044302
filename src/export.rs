//! Export note text as a PDF file.
//!
//! Backs `polity render` and the `--pdf` flag of `polity notes`. Reading
//! from `-` takes the note text from stdin, so generated notes can be piped
//! straight in.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::config::RenderConfig;
use crate::progress::{Progress, ProgressEvent};
use crate::render;

/// Render `text` and write the PDF to `path`, creating parent directories.
pub fn export_pdf(
    text: &str,
    title: &str,
    path: &Path,
    config: &RenderConfig,
    progress: &dyn Progress,
) -> Result<()> {
    progress.report(ProgressEvent::Rendering {
        title: title.to_string(),
    });
    let bytes = render::render_document(text, title, config)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, &bytes)
        .with_context(|| format!("Failed to write PDF: {}", path.display()))?;
    eprintln!("Exported {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// CLI entry point for `polity render`.
///
/// The title defaults to the input file stem, the output to a name derived
/// from the title.
pub fn run_render(
    config: &RenderConfig,
    input: &Path,
    title: Option<String>,
    output: Option<PathBuf>,
    progress: &dyn Progress,
) -> Result<()> {
    let text = if input == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read input file: {}", input.display()))?;
        String::from_utf8_lossy(&bytes).into_owned()
    };

    let title = title.unwrap_or_else(|| {
        input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| s != "-")
            .unwrap_or_else(|| "Notes".to_string())
    });
    let output = output.unwrap_or_else(|| PathBuf::from(render::artifact_name(&title)));

    export_pdf(&text, &title, &output, config, progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;
    use tempfile::TempDir;

    #[test]
    fn test_render_file_to_pdf() {
        let tmp = TempDir::new().unwrap();
        let input = tmp.path().join("money-bill.md");
        std::fs::write(&input, "# Overview\n- a **Money Bill** needs assent\n").unwrap();
        let output = tmp.path().join("out/notes.pdf");

        run_render(
            &RenderConfig::default(),
            &input,
            None,
            Some(output.clone()),
            &NoProgress,
        )
        .unwrap();

        let bytes = std::fs::read(&output).unwrap();
        let text = render::shown_text(&bytes);
        assert!(text.starts_with("money-bill"));
        assert!(text.contains("Money Bill"));
        assert!(!text.contains("**"));
    }

    #[test]
    fn test_missing_input() {
        let tmp = TempDir::new().unwrap();
        let err = run_render(
            &RenderConfig::default(),
            &tmp.path().join("nope.md"),
            None,
            Some(tmp.path().join("x.pdf")),
            &NoProgress,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope.md"));
    }
}
