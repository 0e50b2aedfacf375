//! Gemini REST client with a fixed retry envelope.
//!
//! The pipeline talks to the model through the [`ModelClient`] seam so tests
//! can script responses; `GeminiClient` is the production implementation.

use crate::error::{ContractError, Result};
use log::warn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const MAX_OUTPUT_TOKENS: u32 = 1500;
const RETRIES: usize = 3;

/// The model-call collaborator: one system instruction plus one user prompt in,
/// raw response text out. Implementations own their retry policy and surface
/// failure only after exhausting it.
pub trait ModelClient {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> impl Future<Output = Result<String>> + Send;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Build from `GEMINI_API_KEY` (required) and `GEMINI_MODEL` (optional).
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| ContractError::MissingConfig("GEMINI_API_KEY".to_string()))?;
        let mut client = Self::new(api_key);
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            client.model = model;
        }
        Ok(client)
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn generate_content(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: user_prompt.to_string(),
                }],
            }],
            system_instruction: Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: system_prompt.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                temperature: 0.0,
                max_output_tokens: MAX_OUTPUT_TOKENS,
            },
        };

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ContractError::ModelCall(format!(
                "Gemini API error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;

        body.candidates
            .and_then(|candidates| candidates.into_iter().next())
            .and_then(|candidate| candidate.content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| ContractError::ModelCall("No candidate text returned".to_string()))
    }

    /// Retry with linearly increasing backoff (2s, 4s, ...) before giving up.
    pub async fn generate_with_retries(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String> {
        let mut last_error = String::new();
        for attempt in 1..=RETRIES {
            match self.generate_content(system_prompt, user_prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    warn!("Gemini API error (attempt {}/{}): {}", attempt, RETRIES, e);
                    last_error = e.to_string();
                    if attempt < RETRIES {
                        sleep(Duration::from_secs(2 * attempt as u64)).await;
                    }
                }
            }
        }
        Err(ContractError::RetriesExhausted {
            attempts: RETRIES,
            last_error,
        })
    }
}

impl ModelClient for GeminiClient {
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        self.generate_with_retries(system_prompt, user_prompt).await
    }
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "systemInstruction")]
    system_instruction: Content,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize, Clone)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize, Clone)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}
