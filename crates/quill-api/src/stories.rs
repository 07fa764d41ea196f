//! Handlers for the story persistence and version-history endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/save-story` | Initial save; `version_id` defaults to 1 |
//! | `GET`    | `/stories` | Latest version per group, filtered and sorted |
//! | `POST`   | `/update-story` | Fork or continue from the row `id` |
//! | `DELETE` | `/delete-story/:id` | 409 if version 1 with siblings |
//! | `DELETE` | `/delete-story-group/:id` | Unconditional bulk delete |
//! | `GET`    | `/story-history/:id` | History of the row's group |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use quill_core::{
  generate::StoryGenerator,
  store::{StoryQuery, StoryStore},
  story::{NewStoryVersion, StoryDraft, StoryVersion},
  version::{SortDir, SortKey},
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

// ─── Save ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SaveStoryBody {
  pub title:      String,
  pub genre:      String,
  #[serde(default)]
  pub setting:    String,
  #[serde(default)]
  pub characters: String,
  #[serde(default)]
  pub themes:     String,
  #[serde(default)]
  pub details:    String,
  #[serde(default)]
  pub status:     String,
  /// Client-supplied on the initial save only; updates are stamped by the
  /// server.
  pub timestamp:  String,
  #[serde(default)]
  pub content:    String,
  #[serde(default = "default_version_id")]
  pub version_id: i64,
  #[serde(default)]
  pub user_id:    String,
}

fn default_version_id() -> i64 {
  1
}

/// `POST /save-story`
pub async fn save<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<SaveStoryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  let story = state
    .store
    .save_story(NewStoryVersion {
      title:      body.title,
      genre:      body.genre,
      setting:    body.setting,
      characters: body.characters,
      themes:     body.themes,
      details:    body.details,
      status:     body.status,
      timestamp:  body.timestamp,
      content:    body.content,
      version_id: body.version_id,
      user_id:    body.user_id,
    })
    .await?;
  Ok((StatusCode::CREATED, Json(story)))
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub title:   Option<String>,
  pub genre:   Option<String>,
  pub status:  Option<String>,
  pub sort_by: Option<String>,
  pub order:   Option<String>,
}

/// `GET /stories?title=&genre=&status=&sort_by=&order=`
pub async fn list<S, G>(
  State(state): State<ApiState<S, G>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<StoryVersion>>, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  let query = StoryQuery {
    title:    params.title,
    genre:    params.genre,
    status:   params.status,
    sort_key: SortKey::from_param(params.sort_by.as_deref()),
    sort_dir: SortDir::from_param(params.order.as_deref()),
  };
  let stories = state.store.list_latest(&query).await?;
  Ok(Json(stories))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Body of `POST /update-story`. Any client-sent timestamp is ignored;
/// the new version is stamped server-side.
#[derive(Debug, Deserialize)]
pub struct UpdateStoryBody {
  pub id:         i64,
  pub title:      String,
  pub genre:      String,
  #[serde(default)]
  pub setting:    String,
  #[serde(default)]
  pub characters: String,
  #[serde(default)]
  pub themes:     String,
  #[serde(default)]
  pub details:    String,
  #[serde(default)]
  pub status:     String,
  #[serde(default)]
  pub content:    String,
  #[serde(default)]
  pub user_id:    String,
}

/// `POST /update-story`
pub async fn update<S, G>(
  State(state): State<ApiState<S, G>>,
  Json(body): Json<UpdateStoryBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  let draft = StoryDraft {
    title:      body.title,
    genre:      body.genre,
    setting:    body.setting,
    characters: body.characters,
    themes:     body.themes,
    details:    body.details,
    status:     body.status,
    content:    body.content,
  };
  let story = state.store.update_story(body.id, draft, body.user_id).await?;
  Ok((StatusCode::CREATED, Json(story)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /delete-story/:id`
pub async fn delete_version<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  state.store.delete_version(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /delete-story-group/:id`
pub async fn delete_group<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<i64>,
) -> Result<StatusCode, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  state.store.delete_group(id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── History ─────────────────────────────────────────────────────────────────

/// `GET /story-history/:id`
pub async fn history<S, G>(
  State(state): State<ApiState<S, G>>,
  Path(id): Path<i64>,
) -> Result<Json<Vec<StoryVersion>>, ApiError>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  let versions = state.store.history(id).await?;
  Ok(Json(versions))
}
