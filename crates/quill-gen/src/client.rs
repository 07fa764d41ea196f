//! Generic client for OpenAI-compatible generation APIs.

use quill_core::generate::{Generated, StoryGenerator, StoryRequest};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::{
  Error, Result,
  prompt::{
    QUESTION_TOKENS, enforce_word_budget, max_story_tokens, parse_questions,
    questions_prompt, story_prompt,
  },
};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Connection settings for an OpenAI-compatible provider. Constructed once
/// at startup from the server configuration and held for the process
/// lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
  pub api_key:    String,
  #[serde(default = "default_base_url")]
  pub base_url:   String,
  #[serde(default = "default_model")]
  pub model:      String,
  #[serde(default = "default_image_size")]
  pub image_size: String,
}

fn default_base_url() -> String {
  "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
  "gpt-4".to_string()
}

fn default_image_size() -> String {
  "1024x1024".to_string()
}

// ─── Wire types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
  model:       &'a str,
  messages:    Vec<ChatMessage<'a>>,
  temperature: f32,
  max_tokens:  u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
  role:    &'a str,
  content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
  choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
  message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
  content: Option<String>,
}

#[derive(Serialize)]
struct ImageRequest<'a> {
  prompt: &'a str,
  n:      u8,
  size:   &'a str,
}

#[derive(Deserialize)]
struct ImageResponse {
  data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
  url: String,
}

// ─── Client ──────────────────────────────────────────────────────────────────

/// Client for any provider speaking the OpenAI chat-completions format.
#[derive(Debug, Clone)]
pub struct OpenAiGenerator {
  client: Client,
  config: GeneratorConfig,
}

impl OpenAiGenerator {
  pub fn new(config: GeneratorConfig) -> Self {
    Self { client: Client::new(), config }
  }

  async fn chat(
    &self,
    prompt: &str,
    temperature: f32,
    max_tokens: u32,
  ) -> Result<String> {
    let request = ChatRequest {
      model: &self.config.model,
      messages: vec![
        ChatMessage { role: "system", content: "You are a helpful assistant." },
        ChatMessage { role: "user", content: prompt },
      ],
      temperature,
      max_tokens,
    };

    debug!(model = %self.config.model, max_tokens, "sending chat completion");
    let response = self
      .client
      .post(format!("{}/chat/completions", self.config.base_url))
      .bearer_auth(&self.config.api_key)
      .json(&request)
      .send()
      .await?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      error!(%status, "chat completion failed");
      return Err(Error::Api { status: status.as_u16(), message });
    }

    let parsed: ChatResponse = response.json().await?;
    parsed
      .choices
      .into_iter()
      .next()
      .and_then(|choice| choice.message.content)
      .ok_or(Error::EmptyResponse)
  }
}

impl StoryGenerator for OpenAiGenerator {
  async fn generate(&self, req: &StoryRequest) -> quill_core::Result<Generated> {
    if req.wants_story() {
      let text = self
        .chat(&story_prompt(req), 0.0, max_story_tokens(req.story_size))
        .await?;
      Ok(Generated::Story(enforce_word_budget(&text, req.story_size)))
    } else {
      let text = self
        .chat(&questions_prompt(req), 0.7, QUESTION_TOKENS)
        .await?;
      Ok(Generated::Questions { questions: parse_questions(&text) })
    }
  }

  async fn generate_image(&self, prompt: &str) -> quill_core::Result<String> {
    let request = ImageRequest { prompt, n: 1, size: &self.config.image_size };

    debug!(size = %self.config.image_size, "sending image generation");
    let response = self
      .client
      .post(format!("{}/images/generations", self.config.base_url))
      .bearer_auth(&self.config.api_key)
      .json(&request)
      .send()
      .await
      .map_err(Error::Http)?;

    let status = response.status();
    if !status.is_success() {
      let message = response.text().await.unwrap_or_default();
      error!(%status, "image generation failed");
      return Err(Error::Api { status: status.as_u16(), message }.into());
    }

    let parsed: ImageResponse =
      response.json().await.map_err(Error::Http)?;
    let url = parsed
      .data
      .into_iter()
      .next()
      .map(|datum| datum.url)
      .ok_or(Error::EmptyResponse)?;
    Ok(url)
  }
}
