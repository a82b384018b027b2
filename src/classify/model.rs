//! OpenAI chat-completions classifier.
//!
//! Asks the model for strict JSON and backfills whatever it leaves out from
//! the keyword rules. Any transport or parse failure surfaces as a
//! `ClassifierError`, which the pipeline recovers from.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Classifier, PartialSuggestion, Suggestion};
use crate::error::{ClassifierError, Error, Result};
use crate::resolver::PageMeta;
use crate::settings::Settings;

const SYSTEM_PROMPT: &str =
    "Classify and summarize domain resources for a public directory. Return strict JSON only.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

pub struct ModelClassifier {
    client: reqwest::blocking::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ModelClassifier {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::Client)?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn from_settings(settings: &Settings, api_key: &str) -> Result<Self> {
        Self::new(
            api_key,
            settings.model_base_url.trim_end_matches('/'),
            settings.model.as_str(),
            Duration::from_secs(settings.fetch_timeout_secs.max(60)),
        )
    }

    fn complete(&self, meta: &PageMeta) -> std::result::Result<String, ClassifierError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system".into(),
                    content: SYSTEM_PROMPT.into(),
                },
                Message {
                    role: "user".into(),
                    content: user_prompt(meta),
                },
            ],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;
        if !response.status().is_success() {
            return Err(ClassifierError::Status(response.status()));
        }

        let body: ChatResponse = response.json()?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ClassifierError::Malformed("response has no choices".into()))
    }
}

impl Classifier for ModelClassifier {
    fn name(&self) -> &'static str {
        "model"
    }

    fn classify(&self, meta: &PageMeta) -> std::result::Result<Suggestion, ClassifierError> {
        let content = self.complete(meta)?;
        debug!(content = %content, "Model response");
        Ok(parse_reply(&content)?.backfill(meta))
    }
}

fn user_prompt(meta: &PageMeta) -> String {
    format!(
        "Return JSON with fields: \
         category_name (Title Case, 1-3 words), \
         group_name (Title Case, 1-3 words, optional), \
         short_title (<=60 chars), \
         description (20-30 words), \
         suggested_category_slug (kebab-case). \n\n\
         URL: {}\nTITLE: {}\nDESC: {}",
        meta.resolved_url, meta.title, meta.description
    )
}

/// Whole reply as JSON, else the outermost `{...}` span inside it.
pub fn parse_reply(text: &str) -> std::result::Result<PartialSuggestion, ClassifierError> {
    static BRACES: OnceLock<Regex> = OnceLock::new();
    let text = text.trim();
    if let Ok(parsed) = serde_json::from_str(text) {
        return Ok(parsed);
    }
    let re = BRACES.get_or_init(|| Regex::new(r"\{[\s\S]*\}").unwrap());
    let span = re
        .find(text)
        .ok_or_else(|| ClassifierError::Malformed(text.chars().take(120).collect()))?;
    serde_json::from_str(span.as_str()).map_err(|e| ClassifierError::Malformed(e.to_string()))
}
