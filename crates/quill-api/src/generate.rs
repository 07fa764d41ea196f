//! Handlers for the generation pass-through endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/generate-story` | Questions on the first round, story after |
//! | `POST` | `/generate-image` | `{"prompt": ...}` → `{"image_url": ...}` |

use axum::{Json, extract::State};
use quill_core::{
  generate::{DEFAULT_STORY_SIZE, Generated, StoryGenerator, StoryRequest},
  store::StoryStore,
};
use serde::{Deserialize, Serialize};

use crate::{ApiState, error::ApiError};

// ─── Story ───────────────────────────────────────────────────────────────────

/// Body of `POST /generate-story`. Field spellings match what the web
/// client sends.
#[derive(Debug, Deserialize)]
pub struct GenerateStoryBody {
  pub genre:      String,
  pub setting:    String,
  pub characters: String,
  pub themes:     String,
  #[serde(default)]
  pub details:    String,
  #[serde(default)]
  pub additional_details: String,
  #[serde(default, rename = "authorPreference")]
  pub author_preference: Option<String>,
  #[serde(default, rename = "storytellingFramework")]
  pub storytelling_framework: Option<String>,
  #[serde(default = "default_story_size", rename = "storySize")]
  pub story_size: u32,
  #[serde(default)]
  pub clarifying_responses: Option<String>,
}

fn default_story_size() -> u32 {
  DEFAULT_STORY_SIZE
}

/// `POST /generate-story`
pub async fn story<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<GenerateStoryBody>,
) -> Result<Json<Generated>, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  let req = StoryRequest {
    genre:                body.genre,
    setting:              body.setting,
    characters:           body.characters,
    themes:               body.themes,
    details:              body.details,
    additional_details:   body.additional_details,
    author_preference:    body.author_preference,
    framework:            body.storytelling_framework,
    story_size:           body.story_size,
    clarifying_responses: body.clarifying_responses,
  };
  let generated = state.generator.generate(&req).await?;
  Ok(Json(generated))
}

// ─── Image ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct GenerateImageBody {
  pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateImageResponse {
  pub image_url: String,
}

/// `POST /generate-image`
pub async fn image<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<GenerateImageBody>,
) -> Result<Json<GenerateImageResponse>, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  let image_url = state.generator.generate_image(&body.prompt).await?;
  Ok(Json(GenerateImageResponse { image_url }))
}
