//! Human-readable explanations of CVE hits.
//!
//! The strategy is chosen once at startup: with an `OPENAI_API_KEY` in the
//! environment a remote chat model writes the summaries, otherwise a
//! deterministic local formatter does.

use crate::config::AppSettings;
use crate::error::{LookupError, LookupResult};
use crate::vuln::CveMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

/// Text used for ports without any hits.
pub const NO_HITS: &str = "No quick CVE hits found by heuristic.";

const LOCAL_NO_HITS: &str = "No CVE hits found by quick heuristic.";
const SUMMARY_CHARS: usize = 250;
const CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Port to explanation text.
pub type Explanations = BTreeMap<u16, String>;

/// Turns CVE hits into explanations.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn explain(&self, cves: &CveMap) -> Explanations;
}

/// Builds the summarizer for this process.
pub fn select_summarizer(settings: &AppSettings) -> Box<dyn Summarizer> {
    match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            match OpenAiSummarizer::new(key.trim(), &settings.summary_model) {
                Ok(remote) => {
                    info!(model = %settings.summary_model, "using remote summaries");
                    return Box::new(remote);
                }
                Err(e) => warn!(error = %e, "remote summarizer unavailable, using local summaries"),
            }
        }
        _ => {}
    }
    Box::new(LocalSummarizer)
}

/// Formats entries as `- <id>: <summary>` lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalSummarizer;

impl LocalSummarizer {
    pub fn summarize(items: &[Value]) -> String {
        if items.is_empty() {
            return LOCAL_NO_HITS.to_string();
        }
        items
            .iter()
            .map(|item| {
                let summary: String = entry_summary(item).chars().take(SUMMARY_CHARS).collect();
                format!("- {}: {}", entry_id(item), summary.trim())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl Summarizer for LocalSummarizer {
    async fn explain(&self, cves: &CveMap) -> Explanations {
        cves.iter()
            .map(|(&port, items)| {
                let text = if items.is_empty() {
                    NO_HITS.to_string()
                } else {
                    Self::summarize(items)
                };
                (port, text)
            })
            .collect()
    }
}

fn entry_id(item: &Value) -> &str {
    ["id", "cve"]
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or("UNKNOWN")
}

fn entry_summary(item: &Value) -> &str {
    ["summary", "vuln"]
        .iter()
        .find_map(|key| item.get(key).and_then(Value::as_str).filter(|s| !s.is_empty()))
        .unwrap_or("")
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Summaries from an OpenAI chat model.
pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: &str, model: &str) -> LookupResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    fn prompt(items: &[Value]) -> String {
        let mut prompt = String::from(
            "You are a helpful cybersecurity assistant.\n\
             Summarize the following CVE entries (id + summary) in 3 short bullet points each:\n\n",
        );
        for item in items {
            prompt.push_str(&format!("{}: {}\n\n", entry_id(item), entry_summary(item)));
        }
        prompt
    }

    async fn complete(&self, items: &[Value]) -> LookupResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Self::prompt(items),
            }],
            max_tokens: 500,
            temperature: 0.2,
        };

        let response = self
            .client
            .post(CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(LookupError::Status(response.status().as_u16()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .ok_or_else(|| LookupError::Malformed("no choices in response".to_string()))
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn explain(&self, cves: &CveMap) -> Explanations {
        let mut explanations = Explanations::new();
        for (&port, items) in cves {
            let text = if items.is_empty() {
                NO_HITS.to_string()
            } else {
                match self.complete(items).await {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(port, error = %e, "remote summary failed");
                        format!(
                            "(AI lookup failed) {}\n\n{}",
                            e,
                            LocalSummarizer::summarize(items)
                        )
                    }
                }
            };
            explanations.insert(port, text);
        }
        explanations
    }
}
