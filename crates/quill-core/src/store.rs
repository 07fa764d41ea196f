//! The `StoryStore` trait and listing query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `quill-store-sqlite`). Higher layers depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use crate::{
  Result,
  story::{NewStoryVersion, StoryDraft, StoryVersion},
  version::{SortDir, SortKey},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`StoryStore::list_latest`].
#[derive(Debug, Clone, Default)]
pub struct StoryQuery {
  /// Case-insensitive substring filter on title.
  pub title:    Option<String>,
  /// Exact, case-sensitive genre filter.
  pub genre:    Option<String>,
  /// Exact status filter.
  pub status:   Option<String>,
  pub sort_key: SortKey,
  pub sort_dir: SortDir,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Quill story store backend.
///
/// Rows are immutable snapshots: saves and updates only ever insert, and
/// deletes remove whole rows. Each mutating operation must execute its
/// read-then-write sequence atomically, so two concurrent edits of one
/// group cannot allocate the same version number.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait StoryStore: Send + Sync {
  /// Insert a snapshot exactly as given; no grouping logic is applied.
  /// The caller asserts this is a fresh group or a caller-managed version
  /// number. A duplicate `(title, genre, version_id)` is rejected with
  /// [`crate::Error::VersionExists`].
  fn save_story(
    &self,
    new: NewStoryVersion,
  ) -> impl Future<Output = Result<StoryVersion>> + Send + '_;

  /// Retrieve a snapshot by id. Returns `None` if not found.
  fn get_story(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<StoryVersion>>> + Send + '_;

  /// Return each group's highest-numbered version, filtered and ordered
  /// by `query`. At most one row per distinct `(title, genre)`.
  fn list_latest<'a>(
    &'a self,
    query: &'a StoryQuery,
  ) -> impl Future<Output = Result<Vec<StoryVersion>>> + Send + 'a;

  /// Record an edit based on the row `base_id`.
  ///
  /// An unchanged title+genre continues the base row's group with the
  /// next version number; a changed title or genre forks a new group at
  /// version 1 and leaves the old group untouched. The new row's
  /// timestamp is assigned by the store, never taken from the caller.
  fn update_story(
    &self,
    base_id: i64,
    draft: StoryDraft,
    user_id: String,
  ) -> impl Future<Output = Result<StoryVersion>> + Send + '_;

  /// Delete one snapshot. A group's version 1 cannot be deleted while
  /// later versions exist ([`crate::Error::FirstVersionProtected`]).
  fn delete_version(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Delete every version in the group containing `id`, unconditionally.
  /// Confirming destructive intent is the caller's responsibility.
  fn delete_group(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<()>> + Send + '_;

  /// Reconstruct the version history of the group containing `id`.
  ///
  /// If the group's original (version 1) is marked completed, the history
  /// collapses to a singleton holding the group's first completed row (or
  /// nothing if none matches). Otherwise every version is returned,
  /// newest first.
  fn history(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Vec<StoryVersion>>> + Send + '_;
}
