//! JSON REST API for Quill.
//!
//! Exposes an axum [`Router`] backed by any [`StoryStore`] plus any
//! [`StoryGenerator`]. Transport concerns (CORS, TLS, request tracing)
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .merge(quill_api::api_router(state))
//! ```

pub mod error;
pub mod generate;
pub mod stories;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get, post},
};
use quill_core::{generate::StoryGenerator, store::StoryStore};

pub use error::ApiError;

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S, G> {
  pub store:     Arc<S>,
  pub generator: Arc<G>,
}

impl<S, G> Clone for ApiState<S, G> {
  fn clone(&self) -> Self {
    Self {
      store:     Arc::clone(&self.store),
      generator: Arc::clone(&self.generator),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// Returns a `Router<()>` so it can be merged into a parent router
/// regardless of that router's own state type.
pub fn api_router<S, G>(state: ApiState<S, G>) -> Router<()>
where
  S: StoryStore + 'static,
  G: StoryGenerator + 'static,
{
  Router::new()
    // Generation
    .route("/generate-story", post(generate::story::<S, G>))
    .route("/generate-image", post(generate::image::<S, G>))
    // Stories
    .route("/save-story", post(stories::save::<S, G>))
    .route("/stories", get(stories::list::<S, G>))
    .route("/update-story", post(stories::update::<S, G>))
    .route("/delete-story/{id}", delete(stories::delete_version::<S, G>))
    .route("/delete-story-group/{id}", delete(stories::delete_group::<S, G>))
    .route("/story-history/{id}", get(stories::history::<S, G>))
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use quill_core::generate::{Generated, StoryRequest};
  use quill_store_sqlite::SqliteStore;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;

  /// Canned generator: questions on the first round, a fixed story once
  /// clarifying responses are present.
  #[derive(Clone)]
  struct StubGenerator;

  impl quill_core::generate::StoryGenerator for StubGenerator {
    async fn generate(
      &self,
      req: &StoryRequest,
    ) -> quill_core::Result<Generated> {
      if req.wants_story() {
        Ok(Generated::Story(
          "Title: The Stub\n---\nA short tale.".to_string(),
        ))
      } else {
        Ok(Generated::Questions {
          questions: vec!["What tone should the story have?".to_string()],
        })
      }
    }

    async fn generate_image(&self, _prompt: &str) -> quill_core::Result<String> {
      Ok("https://images.example/stub.png".to_string())
    }
  }

  async fn make_state() -> ApiState<SqliteStore, StubGenerator> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    ApiState {
      store:     Arc::new(store),
      generator: Arc::new(StubGenerator),
    }
  }

  async fn request(
    state:  ApiState<SqliteStore, StubGenerator>,
    method: &str,
    uri:    &str,
    body:   Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(json) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(json.to_string())
      }
      None => Body::empty(),
    };
    let response = api_router(state)
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
      .await
      .unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn save_body(title: &str, genre: &str, version_id: i64) -> Value {
    json!({
      "title": title,
      "genre": genre,
      "setting": "a seaside village",
      "characters": "Mira",
      "themes": "belonging",
      "details": "",
      "status": "draft",
      "timestamp": "2026-01-10T09:00:00Z",
      "content": "The lamp went out on a Tuesday.",
      "version_id": version_id,
      "user_id": "u1",
    })
  }

  fn update_body(id: i64, title: &str, genre: &str) -> Value {
    json!({
      "id": id,
      "title": title,
      "genre": genre,
      "setting": "a seaside village",
      "characters": "Mira",
      "themes": "belonging",
      "details": "",
      "status": "draft",
      "content": "The lamp went out on a Wednesday.",
      "user_id": "u1",
    })
  }

  // ── Save and list ──────────────────────────────────────────────────────────

  #[tokio::test]
  async fn save_returns_201_with_the_persisted_row() {
    let state = make_state().await;
    let (status, body) =
      request(state, "POST", "/save-story", Some(save_body("Alpha", "Fantasy", 1)))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["title"], "Alpha");
    assert_eq!(body["version_id"], 1);
    assert!(body["id"].as_i64().unwrap() > 0);
  }

  #[tokio::test]
  async fn save_without_version_id_defaults_to_one() {
    let state = make_state().await;
    let mut body = save_body("Alpha", "Fantasy", 1);
    body.as_object_mut().unwrap().remove("version_id");
    let (status, saved) =
      request(state, "POST", "/save-story", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(saved["version_id"], 1);
  }

  #[tokio::test]
  async fn duplicate_save_returns_409() {
    let state = make_state().await;
    request(state.clone(), "POST", "/save-story", Some(save_body("Alpha", "Fantasy", 1)))
      .await;
    let (status, _) =
      request(state, "POST", "/save-story", Some(save_body("Alpha", "Fantasy", 1)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
  }

  #[tokio::test]
  async fn list_shows_one_latest_row_per_group() {
    let state = make_state().await;
    let (_, saved) = request(
      state.clone(),
      "POST",
      "/save-story",
      Some(save_body("Alpha", "Fantasy", 1)),
    )
    .await;
    let base_id = saved["id"].as_i64().unwrap();

    // Continuation: same title and genre.
    let (status, updated) = request(
      state.clone(),
      "POST",
      "/update-story",
      Some(update_body(base_id, "Alpha", "Fantasy")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(updated["version_id"], 2);

    let (status, listed) = request(state, "GET", "/stories", None).await;
    assert_eq!(status, StatusCode::OK);
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["version_id"], 2);
  }

  #[tokio::test]
  async fn list_applies_filters_and_sort_params() {
    let state = make_state().await;
    request(state.clone(), "POST", "/save-story", Some(save_body("Aurora", "Fantasy", 1)))
      .await;
    request(state.clone(), "POST", "/save-story", Some(save_body("Zephyr", "Horror", 1)))
      .await;

    let (status, listed) = request(
      state.clone(),
      "GET",
      "/stories?genre=Horror",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let rows = listed.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["title"], "Zephyr");

    let (_, listed) = request(
      state,
      "GET",
      "/stories?sort_by=title&order=asc",
      None,
    )
    .await;
    let titles: Vec<&str> = listed
      .as_array()
      .unwrap()
      .iter()
      .map(|row| row["title"].as_str().unwrap())
      .collect();
    assert_eq!(titles, vec!["Aurora", "Zephyr"]);
  }

  #[tokio::test]
  async fn unknown_sort_params_fall_back_to_timestamp() {
    let state = make_state().await;
    let mut early = save_body("Early", "Fantasy", 1);
    early["timestamp"] = json!("2026-01-09 23:00:00");
    let mut late = save_body("Late", "Fantasy", 1);
    late["timestamp"] = json!("2026-01-10T08:00:00Z");
    request(state.clone(), "POST", "/save-story", Some(late)).await;
    request(state.clone(), "POST", "/save-story", Some(early)).await;

    // `sort_by` falls back to timestamp; a non-desc `order` sorts
    // ascending.
    let (status, listed) = request(
      state,
      "GET",
      "/stories?sort_by=wordcount&order=sideways",
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = listed
      .as_array()
      .unwrap()
      .iter()
      .map(|row| row["title"].as_str().unwrap())
      .collect();
    assert_eq!(titles, vec!["Early", "Late"]);
  }

  // ── Update ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn update_with_changed_title_forks_at_version_one() {
    let state = make_state().await;
    let (_, saved) = request(
      state.clone(),
      "POST",
      "/save-story",
      Some(save_body("Alpha", "Fantasy", 1)),
    )
    .await;
    let base_id = saved["id"].as_i64().unwrap();

    let (status, forked) = request(
      state.clone(),
      "POST",
      "/update-story",
      Some(update_body(base_id, "Alpha Reborn", "Fantasy")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(forked["version_id"], 1);
    assert_eq!(forked["title"], "Alpha Reborn");

    // Both groups are now listed.
    let (_, listed) = request(state, "GET", "/stories", None).await;
    assert_eq!(listed.as_array().unwrap().len(), 2);
  }

  #[tokio::test]
  async fn update_missing_base_returns_404() {
    let state = make_state().await;
    let (status, body) = request(
      state,
      "POST",
      "/update-story",
      Some(update_body(404, "Alpha", "Fantasy")),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("404"));
  }

  // ── Delete ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn deleting_first_version_with_siblings_returns_409() {
    let state = make_state().await;
    let (_, v1) = request(
      state.clone(),
      "POST",
      "/save-story",
      Some(save_body("Alpha", "Fantasy", 1)),
    )
    .await;
    let (_, v2) = request(
      state.clone(),
      "POST",
      "/save-story",
      Some(save_body("Alpha", "Fantasy", 2)),
    )
    .await;
    let (v1_id, v2_id) = (v1["id"].as_i64().unwrap(), v2["id"].as_i64().unwrap());

    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/delete-story/{v1_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/delete-story/{v2_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = request(
      state,
      "DELETE",
      &format!("/delete-story/{v1_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
  }

  #[tokio::test]
  async fn delete_missing_returns_404() {
    let state = make_state().await;
    let (status, _) =
      request(state, "DELETE", "/delete-story/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn delete_group_removes_every_version() {
    let state = make_state().await;
    request(state.clone(), "POST", "/save-story", Some(save_body("Alpha", "Fantasy", 1)))
      .await;
    let (_, v2) = request(
      state.clone(),
      "POST",
      "/save-story",
      Some(save_body("Alpha", "Fantasy", 2)),
    )
    .await;
    let v2_id = v2["id"].as_i64().unwrap();

    let (status, _) = request(
      state.clone(),
      "DELETE",
      &format!("/delete-story-group/{v2_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, listed) = request(state, "GET", "/stories", None).await;
    assert!(listed.as_array().unwrap().is_empty());
  }

  // ── History ────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn history_lists_versions_newest_first() {
    let state = make_state().await;
    let (_, v1) = request(
      state.clone(),
      "POST",
      "/save-story",
      Some(save_body("Alpha", "Fantasy", 1)),
    )
    .await;
    let base_id = v1["id"].as_i64().unwrap();
    request(
      state.clone(),
      "POST",
      "/update-story",
      Some(update_body(base_id, "Alpha", "Fantasy")),
    )
    .await;

    let (status, history) = request(
      state,
      "GET",
      &format!("/story-history/{base_id}"),
      None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let versions: Vec<i64> = history
      .as_array()
      .unwrap()
      .iter()
      .map(|row| row["version_id"].as_i64().unwrap())
      .collect();
    assert_eq!(versions, vec![2, 1]);
  }

  #[tokio::test]
  async fn history_of_completed_group_collapses_to_one_row() {
    let state = make_state().await;
    let mut v1 = save_body("Alpha", "Fantasy", 1);
    v1["status"] = json!("completed");
    let (_, saved) =
      request(state.clone(), "POST", "/save-story", Some(v1)).await;
    let mut v2 = save_body("Alpha", "Fantasy", 2);
    v2["status"] = json!("completed");
    request(state.clone(), "POST", "/save-story", Some(v2)).await;

    let id = saved["id"].as_i64().unwrap();
    let (status, history) =
      request(state, "GET", &format!("/story-history/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
  }

  #[tokio::test]
  async fn history_missing_returns_404() {
    let state = make_state().await;
    let (status, _) =
      request(state, "GET", "/story-history/404", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  // ── Generation ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn generate_story_first_round_returns_questions() {
    let state = make_state().await;
    let (status, body) = request(
      state,
      "POST",
      "/generate-story",
      Some(json!({
        "genre": "Fantasy",
        "setting": "a seaside village",
        "characters": "Mira",
        "themes": "belonging",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
      body["questions"][0],
      "What tone should the story have?"
    );
  }

  #[tokio::test]
  async fn generate_story_with_responses_returns_plain_text() {
    let state = make_state().await;
    let (status, body) = request(
      state,
      "POST",
      "/generate-story",
      Some(json!({
        "genre": "Fantasy",
        "setting": "a seaside village",
        "characters": "Mira",
        "themes": "belonging",
        "storySize": 500,
        "clarifying_responses": "melancholy tone | first person",
      })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.starts_with("Title:"));
    assert!(text.contains("---"));
  }

  #[tokio::test]
  async fn generate_image_returns_url() {
    let state = make_state().await;
    let (status, body) = request(
      state,
      "POST",
      "/generate-image",
      Some(json!({ "prompt": "a lighthouse at dusk" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["image_url"], "https://images.example/stub.png");
  }
}
