//! The `StoryGenerator` trait and its request/response types.
//!
//! Generation is a pass-through to an external text-completion provider.
//! The first call for a story usually elicits clarifying questions; a
//! second call carrying the answers produces the narrative itself.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Target story length, in words, when the caller does not specify one.
pub const DEFAULT_STORY_SIZE: u32 = 1000;

/// Inputs to a generation call.
#[derive(Debug, Clone)]
pub struct StoryRequest {
  pub genre:              String,
  pub setting:            String,
  pub characters:         String,
  pub themes:             String,
  /// Additional plot points woven into the narrative.
  pub details:            String,
  /// Free-form extra context, only used while eliciting questions.
  pub additional_details: String,
  /// Author whose writing style the narrative should mimic, if any.
  pub author_preference:  Option<String>,
  /// Storytelling framework the narrative should follow, if any.
  pub framework:          Option<String>,
  /// Target length in words.
  pub story_size:         u32,
  /// Answers to a previous round of clarifying questions. Present and
  /// non-empty means "generate the final story"; otherwise the provider
  /// is asked for questions.
  pub clarifying_responses: Option<String>,
}

impl Default for StoryRequest {
  fn default() -> Self {
    Self {
      genre:                String::new(),
      setting:              String::new(),
      characters:           String::new(),
      themes:               String::new(),
      details:              String::new(),
      additional_details:   String::new(),
      author_preference:    None,
      framework:            None,
      story_size:           DEFAULT_STORY_SIZE,
      clarifying_responses: None,
    }
  }
}

impl StoryRequest {
  /// Whether this request should produce the final narrative rather than
  /// another round of questions.
  pub fn wants_story(&self) -> bool {
    self
      .clarifying_responses
      .as_deref()
      .is_some_and(|r| !r.trim().is_empty())
  }
}

/// Outcome of a generation call: either the finished story as plain text
/// (`Title: …` header, `---` separator, narrative body) or a round of
/// clarifying questions.
///
/// Serialises untagged so the story is a bare JSON string and questions
/// are `{"questions": [...]}`, matching what clients parse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Generated {
  Questions { questions: Vec<String> },
  Story(String),
}

/// Abstraction over the text/image generation provider.
///
/// No retry, caching, or budget logic lives behind this trait; failures
/// are terminal for the calling operation.
pub trait StoryGenerator: Send + Sync {
  fn generate<'a>(
    &'a self,
    req: &'a StoryRequest,
  ) -> impl Future<Output = Result<Generated>> + Send + 'a;

  /// Produce an illustration for `prompt` and return its URL.
  fn generate_image<'a>(
    &'a self,
    prompt: &'a str,
  ) -> impl Future<Output = Result<String>> + Send + 'a;
}
