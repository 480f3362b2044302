//! TOML configuration.
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. [`load_config`] validates the values that would otherwise
//! surface as confusing failures deep inside search, layout, or the note
//! generator.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub notes: NotesConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorpusConfig {
    /// Bundled corpus used when no upload is given.
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("data/pol.txt")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Matching lines shown per chapter in listings.
    #[serde(default = "default_snippet_limit")]
    pub snippet_limit: usize,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            snippet_limit: default_snippet_limit(),
            max_results: None,
        }
    }
}

fn default_snippet_limit() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct NotesConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key when none is passed in.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Chapters of context sent with one request. Bounds the request size.
    #[serde(default = "default_max_chapters")]
    pub max_chapters: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            max_chapters: default_max_chapters(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_max_chapters() -> usize {
    15
}
fn default_timeout_secs() -> u64 {
    60
}

impl NotesConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Page geometry and type sizes, in PDF points.
#[derive(Debug, Deserialize, Clone)]
pub struct RenderConfig {
    #[serde(default = "default_page_width")]
    pub page_width: f32,
    #[serde(default = "default_page_height")]
    pub page_height: f32,
    /// Left, right, top, and bottom margin.
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default = "default_body_size")]
    pub body_size: f32,
    #[serde(default = "default_heading_size")]
    pub heading_size: f32,
    #[serde(default = "default_title_size")]
    pub title_size: f32,
    /// Line height as a multiple of the font size.
    #[serde(default = "default_line_spacing")]
    pub line_spacing: f32,
    /// Distance from the left margin to the bullet dash.
    #[serde(default = "default_bullet_offset")]
    pub bullet_offset: f32,
    /// Distance from the left margin to the bullet text.
    #[serde(default = "default_bullet_indent")]
    pub bullet_indent: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            page_width: default_page_width(),
            page_height: default_page_height(),
            margin: default_margin(),
            body_size: default_body_size(),
            heading_size: default_heading_size(),
            title_size: default_title_size(),
            line_spacing: default_line_spacing(),
            bullet_offset: default_bullet_offset(),
            bullet_indent: default_bullet_indent(),
        }
    }
}

// A4
fn default_page_width() -> f32 {
    595.28
}
fn default_page_height() -> f32 {
    841.89
}
fn default_margin() -> f32 {
    42.5
}
fn default_body_size() -> f32 {
    11.0
}
fn default_heading_size() -> f32 {
    14.0
}
fn default_title_size() -> f32 {
    16.0
}
fn default_line_spacing() -> f32 {
    1.4
}
fn default_bullet_offset() -> f32 {
    5.0
}
fn default_bullet_indent() -> f32 {
    15.0
}

impl RenderConfig {
    /// Width available to text between the margins.
    pub fn text_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

impl Config {
    /// All defaults. Used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config = parse_config(&content)?;

    // A relative corpus path is resolved against the config file's directory.
    if config.corpus.path.is_relative() {
        if let Some(dir) = path.parent() {
            let mut config = config;
            config.corpus.path = dir.join(&config.corpus.path);
            return Ok(config);
        }
    }
    Ok(config)
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.search.snippet_limit == 0 {
        anyhow::bail!("search.snippet_limit must be >= 1");
    }
    if config.search.max_results == Some(0) {
        anyhow::bail!("search.max_results must be >= 1 when set");
    }

    if config.notes.max_chapters == 0 {
        anyhow::bail!("notes.max_chapters must be >= 1");
    }
    match config.notes.provider.as_str() {
        "disabled" | "gemini" => {}
        other => anyhow::bail!(
            "Unknown notes provider: '{}'. Must be disabled or gemini.",
            other
        ),
    }
    if config.notes.is_enabled() && config.notes.model.trim().is_empty() {
        anyhow::bail!(
            "notes.model must be specified when provider is '{}'",
            config.notes.provider
        );
    }

    let r = &config.render;
    for (name, size) in [
        ("body_size", r.body_size),
        ("heading_size", r.heading_size),
        ("title_size", r.title_size),
        ("line_spacing", r.line_spacing),
    ] {
        if size <= 0.0 {
            anyhow::bail!("render.{} must be > 0", name);
        }
    }
    if r.margin < 0.0 || r.bullet_offset < 0.0 {
        anyhow::bail!("render.margin and render.bullet_offset must be >= 0");
    }
    if r.bullet_indent <= r.bullet_offset {
        anyhow::bail!("render.bullet_indent must be greater than render.bullet_offset");
    }
    if r.text_width() <= r.bullet_indent {
        anyhow::bail!("render margins leave no room for text");
    }
    if r.page_height <= 2.0 * r.margin + r.title_size * r.line_spacing {
        anyhow::bail!("render.page_height is too small for the margins");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.search.snippet_limit, 3);
        assert_eq!(cfg.notes.max_chapters, 15);
        assert_eq!(cfg.notes.model, "gemini-2.5-flash");
        assert!(cfg.notes.is_enabled());
        assert_eq!(cfg.corpus.path, PathBuf::from("data/pol.txt"));
    }

    #[test]
    fn test_partial_section() {
        let cfg = parse_config("[notes]\nmax_chapters = 4\nprovider = \"disabled\"\n").unwrap();
        assert_eq!(cfg.notes.max_chapters, 4);
        assert!(!cfg.notes.is_enabled());
        assert_eq!(cfg.notes.timeout_secs, 60);
    }

    #[test]
    fn test_rejects_unknown_provider() {
        let err = parse_config("[notes]\nprovider = \"oracle\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown notes provider"));
    }

    #[test]
    fn test_rejects_zero_cap() {
        assert!(parse_config("[notes]\nmax_chapters = 0\n").is_err());
        assert!(parse_config("[search]\nsnippet_limit = 0\n").is_err());
    }

    #[test]
    fn test_rejects_bad_geometry() {
        assert!(parse_config("[render]\nmargin = 300.0\n").is_err());
        assert!(parse_config("[render]\nbody_size = 0.0\n").is_err());
        assert!(parse_config("[render]\nbullet_indent = 2.0\n").is_err());
    }

    #[test]
    fn test_relative_corpus_resolved_against_config_dir() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("polity.toml");
        std::fs::write(&path, "[corpus]\npath = \"pol.txt\"\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.corpus.path, tmp.path().join("pol.txt"));
    }
}
