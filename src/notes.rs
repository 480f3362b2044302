//! Note generator abstraction and implementations.
//!
//! Defines the [`NoteGenerator`] trait and concrete implementations:
//! - **[`DisabledGenerator`]**: always fails; used when `[notes] provider = "disabled"`.
//! - **[`GeminiGenerator`]**: calls the Gemini `generateContent` REST endpoint.
//!
//! Use [`create_generator`] to build the configured generator and
//! [`generate_notes`] to turn search results into a synthesized note.
//!
//! # Failure policy
//!
//! There is no retry. A network error, a non-2xx status, or a response
//! without text becomes a [`NotesError`] and the caller shows the message.
//! Search results already displayed are never affected.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::NotesConfig;
use crate::error::NotesError;
use crate::models::SearchResult;

/// A hosted generative-text service.
#[async_trait]
pub trait NoteGenerator: Send + Sync {
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    fn model_name(&self) -> &str;
    /// Send `prompt` and return the generated text.
    async fn generate(&self, prompt: &str) -> Result<String, NotesError>;
}

// ============ Disabled Generator ============

pub struct DisabledGenerator;

#[async_trait]
impl NoteGenerator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, NotesError> {
        Err(NotesError::Disabled)
    }
}

// ============ Gemini Generator ============

/// Gemini `models/{model}:generateContent` client.
///
/// The API key is request-scoped: it is passed in when the generator is
/// built and never stored anywhere else.
pub struct GeminiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(config: &NotesConfig, api_key: String) -> Result<Self, NotesError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl NoteGenerator for GeminiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, NotesError> {
        let body = serde_json::json!({
            "contents": [
                { "role": "user", "parts": [ { "text": prompt } ] }
            ]
        });

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotesError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = response.json().await?;
        parse_gemini_response(&json)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_gemini_response(json: &serde_json::Value) -> Result<String, NotesError> {
    let parts = json
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
        .ok_or_else(|| {
            let reason = json
                .pointer("/promptFeedback/blockReason")
                .and_then(|r| r.as_str())
                .map(|r| format!("prompt blocked: {}", r))
                .unwrap_or_else(|| "missing candidates[0].content.parts".to_string());
            NotesError::MalformedResponse(reason)
        })?;

    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.trim().is_empty() {
        return Err(NotesError::MalformedResponse(
            "response contained no text".to_string(),
        ));
    }
    Ok(text)
}

/// Build the configured generator.
///
/// `api_key` is the key supplied with this request. When absent, the
/// environment variable named by `config.api_key_env` is used.
pub fn create_generator(
    config: &NotesConfig,
    api_key: Option<String>,
) -> Result<Box<dyn NoteGenerator>, NotesError> {
    match config.provider.as_str() {
        "gemini" => {
            let key = api_key
                .filter(|k| !k.trim().is_empty())
                .or_else(|| std::env::var(&config.api_key_env).ok())
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| NotesError::MissingApiKey(config.api_key_env.clone()))?;
            Ok(Box::new(GeminiGenerator::new(config, key)?))
        }
        _ => Ok(Box::new(DisabledGenerator)),
    }
}

/// Build the synthesis prompt from at most `max_chapters` chapter bodies.
pub fn build_prompt(query: &str, results: &[SearchResult], max_chapters: usize) -> String {
    let material = results
        .iter()
        .take(max_chapters)
        .map(|r| r.body.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        "You are an expert tutor for Indian Polity. Below are textbook excerpts that mention \
the concept \"{query}\". Synthesize them into one connected study note.\n\
\n\
Instructions:\n\
- Use simple, clear, high-yield language.\n\
- Keep the constitutional meaning and its nuances intact.\n\
- Show how the concept connects across chapters (for example Executive and Legislature).\n\
\n\
Material:\n\
{material}\n\
\n\
Structure the note as:\n\
# Overview\n\
# Key Linkages\n\
# Quick Recall\n\
Use `-` bullets for lists."
    )
}

/// Synthesize notes for `query` from its search results.
pub async fn generate_notes(
    generator: &dyn NoteGenerator,
    query: &str,
    results: &[SearchResult],
    config: &NotesConfig,
) -> Result<String, NotesError> {
    if results.is_empty() {
        return Err(NotesError::NoContext);
    }
    let used = results.len().min(config.max_chapters);
    if used < results.len() {
        tracing::info!(
            total = results.len(),
            used,
            "capping chapters sent to note generator"
        );
    }

    let prompt = build_prompt(query, results, config.max_chapters);
    tracing::debug!(
        model = generator.model_name(),
        prompt_chars = prompt.len(),
        "requesting notes"
    );
    generator.generate(&prompt).await
}

/// Local stand-in for `generateContent`. Answers every call with `status`;
/// a 2xx reply echoes the API key header and the prompt as
/// `key=<key>\n<prompt>`. Returns the base URL to put in `notes.base_url`.
#[cfg(test)]
pub(crate) async fn spawn_mock_gemini(status: u16) -> String {
    use axum::{
        http::{HeaderMap, StatusCode},
        routing::post,
        Json, Router,
    };

    let app = Router::new().route(
        "/models/{*method}",
        post(
            move |headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                let status = StatusCode::from_u16(status).unwrap();
                let key = headers
                    .get("x-goog-api-key")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default();
                let prompt = body
                    .pointer("/contents/0/parts/0/text")
                    .and_then(|t| t.as_str())
                    .unwrap_or_default();
                let reply = if status.is_success() {
                    serde_json::json!({
                        "candidates": [
                            { "content": { "parts": [ { "text": format!("key={}\n{}", key, prompt) } ] } }
                        ]
                    })
                } else {
                    serde_json::json!({ "error": { "code": status.as_u16(), "message": "quota exceeded" } })
                };
                (status, Json(reply))
            },
        ),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{}", addr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn result(title: &str, body: &str) -> SearchResult {
        SearchResult {
            title: title.to_string(),
            body: body.to_string(),
            matching_lines: vec![body.to_string()],
        }
    }

    /// Records the prompt it was given and answers with a fixed note.
    struct Recording {
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NoteGenerator for Recording {
        fn model_name(&self) -> &str {
            "recording"
        }
        async fn generate(&self, prompt: &str) -> Result<String, NotesError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("# Overview\n- linked".to_string())
        }
    }

    #[test]
    fn test_prompt_contains_query_and_bodies() {
        let results = vec![result("A", "body one"), result("B", "body two")];
        let prompt = build_prompt("Money Bill", &results, 15);
        assert!(prompt.contains("\"Money Bill\""));
        assert!(prompt.contains("body one\n\nbody two"));
    }

    #[test]
    fn test_prompt_caps_chapters() {
        let results: Vec<SearchResult> = (0..20)
            .map(|i| result(&i.to_string(), &format!("chapter-body-{}", i)))
            .collect();
        let prompt = build_prompt("q", &results, 15);
        assert!(prompt.contains("chapter-body-14"));
        assert!(!prompt.contains("chapter-body-15"));
    }

    #[tokio::test]
    async fn test_generate_notes_uses_cap() {
        let gen = Recording {
            prompts: Mutex::new(Vec::new()),
        };
        let config = NotesConfig {
            max_chapters: 1,
            ..NotesConfig::default()
        };
        let results = vec![result("A", "first body"), result("B", "second body")];
        let notes = generate_notes(&gen, "q", &results, &config).await.unwrap();
        assert!(notes.starts_with("# Overview"));

        let prompts = gen.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("first body"));
        assert!(!prompts[0].contains("second body"));
    }

    #[tokio::test]
    async fn test_generate_notes_requires_context() {
        let err = generate_notes(&DisabledGenerator, "q", &[], &NotesConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, NotesError::NoContext));
    }

    #[tokio::test]
    async fn test_disabled_generator_fails() {
        let config = NotesConfig {
            provider: "disabled".to_string(),
            ..NotesConfig::default()
        };
        let gen = create_generator(&config, None).unwrap();
        assert_eq!(gen.model_name(), "disabled");
        let err = gen.generate("hi").await.unwrap_err();
        assert!(matches!(err, NotesError::Disabled));
    }

    #[test]
    fn test_missing_api_key() {
        let config = NotesConfig {
            api_key_env: "POLITY_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..NotesConfig::default()
        };
        match create_generator(&config, Some("  ".to_string())) {
            Err(NotesError::MissingApiKey(var)) => {
                assert_eq!(var, "POLITY_TEST_KEY_THAT_IS_NOT_SET")
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("expected missing key error"),
        }
    }

    #[test]
    fn test_explicit_key_builds_gemini() {
        let gen = create_generator(&NotesConfig::default(), Some("k".to_string())).unwrap();
        assert_eq!(gen.model_name(), "gemini-2.5-flash");
    }

    #[test]
    fn test_endpoint() {
        let config = NotesConfig {
            base_url: "http://localhost:9999/v1beta/".to_string(),
            ..NotesConfig::default()
        };
        let gen = GeminiGenerator::new(&config, "k".to_string()).unwrap();
        assert_eq!(
            gen.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    fn gemini_at(base_url: String) -> GeminiGenerator {
        let config = NotesConfig {
            base_url,
            ..NotesConfig::default()
        };
        GeminiGenerator::new(&config, "secret".to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_gemini_sends_key_and_prompt() {
        let gen = gemini_at(spawn_mock_gemini(200).await);
        let text = gen.generate("Money Bill").await.unwrap();
        assert_eq!(text, "key=secret\nMoney Bill");
    }

    #[tokio::test]
    async fn test_gemini_error_status() {
        let gen = gemini_at(spawn_mock_gemini(429).await);
        match gen.generate("q").await {
            Err(NotesError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("quota exceeded"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_gemini_unreachable() {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gen = gemini_at(format!("http://{}", addr));
        let err = gen.generate("q").await.unwrap_err();
        assert!(matches!(err, NotesError::Http(_)));
    }

    #[tokio::test]
    async fn test_generate_notes_through_gemini() {
        let config = NotesConfig {
            base_url: spawn_mock_gemini(200).await,
            ..NotesConfig::default()
        };
        let gen = create_generator(&config, Some("secret".to_string())).unwrap();
        let results = vec![result("The Legislature", "A Money Bill needs assent.")];
        let notes = generate_notes(gen.as_ref(), "Money Bill", &results, &config)
            .await
            .unwrap();
        assert!(notes.starts_with("key=secret\n"));
        assert!(notes.contains("A Money Bill needs assent."));
    }

    #[test]
    fn test_parse_response_joins_parts() {
        let json = serde_json::json!({
            "candidates": [
                { "content": { "parts": [ { "text": "# Overview\n" }, { "text": "- point" } ] } }
            ]
        });
        assert_eq!(parse_gemini_response(&json).unwrap(), "# Overview\n- point");
    }

    #[test]
    fn test_parse_response_blocked() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let err = parse_gemini_response(&json).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_response_empty_text() {
        let json = serde_json::json!({
            "candidates": [ { "content": { "parts": [ { "text": "  " } ] } } ]
        });
        assert!(matches!(
            parse_gemini_response(&json),
            Err(NotesError::MalformedResponse(_))
        ));
    }
}
