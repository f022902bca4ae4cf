//! AI quiz generation.
//!
//! A subject's notes and file excerpts are folded into a single prompt and
//! sent to a hosted model. The raw reply is returned as-is; any failure turns
//! into a fixed apology message. There is no retry and no streaming.

use async_trait::async_trait;
use indoc::formatdoc;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::QuizError;
use crate::storage::AiConfig;
use crate::subject::Subject;

pub const FAILURE_MESSAGE: &str =
    "Sorry, something went wrong while generating the quiz. Please try again.";

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Prompt shaping knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizConfig {
    pub question_count: u32,
    /// Characters of each file's text included in the prompt.
    pub excerpt_chars: usize,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            question_count: 5,
            excerpt_chars: 1000,
        }
    }
}

impl From<&AiConfig> for QuizConfig {
    fn from(cfg: &AiConfig) -> Self {
        Self {
            question_count: cfg.question_count,
            excerpt_chars: cfg.excerpt_chars,
        }
    }
}

/// The subject material section of the prompt.
pub fn subject_material(subject: &Subject, cfg: &QuizConfig) -> String {
    let mut out = format!("Subject: {}\n\n", subject.name);

    if !subject.notes.is_empty() {
        out.push_str("Notes:\n");
        for (i, note) in subject.notes.iter().enumerate() {
            out.push_str(&format!("{}. {}\n", i + 1, note));
        }
        out.push('\n');
    }

    if !subject.files.is_empty() {
        out.push_str("Files:\n");
        for (i, file) in subject.files.iter().enumerate() {
            out.push_str(&format!("{}. {}", i + 1, file.name));
            if !file.content.is_empty() {
                let excerpt: String = file.content.chars().take(cfg.excerpt_chars).collect();
                out.push_str(&format!("\nContent: {excerpt}..."));
            }
            out.push_str("\n\n");
        }
    }

    out
}

pub fn build_prompt(subject: &Subject, cfg: &QuizConfig) -> String {
    let material = subject_material(subject, cfg);
    let n = cfg.question_count;
    formatdoc! {"
        Based on the following content for the subject \"{name}\", write a quiz of {n} multiple-choice questions (4 options each) and list the correct answers at the end:

        {material}

        Format:
        1. Question
        a) Option A
        b) Option B
        c) Option C
        d) Option D

        (Repeat for all {n} questions, and finish with \"Correct answers: 1-a, 2-b...\" etc)",
        name = subject.name,
    }
}

/// A hosted text generation model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, QuizError>;
}

/// Google Gemini `generateContent` client.
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, model)
    }

    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        }
    }

    /// Build from config; `None` when no API key is available.
    pub fn from_config(cfg: &AiConfig) -> Option<Self> {
        let key = cfg.resolved_api_key()?;
        Some(Self::with_endpoint(&cfg.endpoint, key, &cfg.model))
    }
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, QuizError> {
        if self.api_key.is_empty() {
            return Err(QuizError::MissingApiKey);
        }
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let resp = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(QuizError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let data: Value = resp.json().await?;
        let text: String = data["candidates"][0]["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(QuizError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Builds prompts and turns model failures into [`FAILURE_MESSAGE`].
pub struct QuizGenerator<M: GenerativeModel> {
    model: M,
    config: QuizConfig,
}

impl<M: GenerativeModel> QuizGenerator<M> {
    pub fn new(model: M, config: QuizConfig) -> Self {
        Self { model, config }
    }

    pub async fn generate(&self, subject: &Subject) -> String {
        let prompt = build_prompt(subject, &self.config);
        match self.model.generate(&prompt).await {
            Ok(text) => {
                info!(subject = %subject.name, chars = text.len(), "quiz generated");
                text
            }
            Err(e) => {
                warn!(subject = %subject.name, error = %e, "quiz generation failed");
                FAILURE_MESSAGE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subject::FileAttachment;
    use std::sync::Mutex;

    struct Recording {
        prompts: Mutex<Vec<String>>,
        reply: Result<String, ()>,
    }

    #[async_trait]
    impl GenerativeModel for Recording {
        async fn generate(&self, prompt: &str) -> Result<String, QuizError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.reply.clone().map_err(|_| QuizError::EmptyResponse)
        }
    }

    fn subject() -> Subject {
        let mut s = Subject::new("Biology", "🧬").unwrap();
        s.notes = vec!["Cells".into(), "DNA".into()];
        s.files = vec![FileAttachment {
            uri: "file:///long.txt".into(),
            name: "long.txt".into(),
            content: "é".repeat(1500),
            mime_type: "text/plain".into(),
            externally_openable: false,
        }];
        s
    }

    #[test]
    fn material_numbers_notes_and_truncates_files() {
        let material = subject_material(&subject(), &QuizConfig::default());
        assert!(material.starts_with("Subject: Biology\n\nNotes:\n1. Cells\n2. DNA\n"));
        assert!(material.contains("Files:\n1. long.txt\nContent: "));
        let excerpt = material.split("Content: ").nth(1).unwrap();
        assert_eq!(excerpt.trim_end().trim_end_matches("...").chars().count(), 1000);
    }

    #[test]
    fn prompt_asks_for_quiz_and_answer_key() {
        let prompt = build_prompt(&subject(), &QuizConfig::default());
        assert!(prompt.contains("quiz of 5 multiple-choice questions (4 options each)"));
        assert!(prompt.contains("Correct answers:"));
        assert!(prompt.contains("1. Cells"));
    }

    #[test]
    fn empty_subject_has_only_header() {
        let s = Subject::new("Empty", "📚").unwrap();
        assert_eq!(subject_material(&s, &QuizConfig::default()), "Subject: Empty\n\n");
    }

    #[tokio::test]
    async fn failures_become_placeholder() {
        let generator = QuizGenerator::new(
            Recording {
                prompts: Mutex::new(Vec::new()),
                reply: Err(()),
            },
            QuizConfig::default(),
        );
        assert_eq!(generator.generate(&subject()).await, FAILURE_MESSAGE);
    }

    #[tokio::test]
    async fn success_returns_raw_text() {
        let generator = QuizGenerator::new(
            Recording {
                prompts: Mutex::new(Vec::new()),
                reply: Ok("1. What is DNA?".into()),
            },
            QuizConfig::default(),
        );
        assert_eq!(generator.generate(&subject()).await, "1. What is DNA?");
        assert_eq!(generator.model.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn gemini_client_parses_candidates() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.5-flash:generateContent")
            .match_query(mockito::Matcher::UrlEncoded("key".into(), "k".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Q1"},{"text":" Q2"}]}}]}"#)
            .create_async()
            .await;

        let client = GeminiClient::with_endpoint(server.url(), "k", "gemini-2.5-flash");
        assert_eq!(client.generate("hi").await.unwrap(), "Q1 Q2");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn gemini_client_reports_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/models/m:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_body("quota")
            .create_async()
            .await;

        let client = GeminiClient::with_endpoint(server.url(), "k", "m");
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, QuizError::Rejected { status: 429, .. }));
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::with_endpoint("http://127.0.0.1:9", "", "m");
        assert!(matches!(
            client.generate("hi").await,
            Err(QuizError::MissingApiKey)
        ));
    }
}
