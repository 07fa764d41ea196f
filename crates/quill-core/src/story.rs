//! Story snapshots and the composite group key.
//!
//! A story row is an immutable snapshot. Editing never mutates a row; it
//! inserts a new one with a fresh `version_id`. All rows sharing a
//! [`GroupKey`] form one version group.

use serde::{Deserialize, Serialize};

/// One immutable snapshot of a story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryVersion {
  /// Store-assigned, monotonically increasing, never reused.
  pub id:         i64,
  pub title:      String,
  pub genre:      String,
  pub setting:    String,
  pub characters: String,
  pub themes:     String,
  pub details:    String,
  /// Free text; the literal `"completed"` (any case) finalizes the group.
  pub status:     String,
  /// Sortable date-time text, stored verbatim. Ordering parses it as a
  /// real date-time rather than relying on string collation.
  pub timestamp:  String,
  pub content:    String,
  /// Positive, unique within the group, starting at 1. Gaps may appear
  /// after deletions.
  pub version_id: i64,
  pub user_id:    String,
}

impl StoryVersion {
  pub fn group_key(&self) -> GroupKey {
    GroupKey {
      title: self.title.clone(),
      genre: self.genre.clone(),
    }
  }
}

/// The composite key that defines a version group: all rows sharing the
/// same title and genre. Both components compare exactly and
/// case-sensitively; the case-insensitive title search in listings is a
/// separate filtering concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
  pub title: String,
  pub genre: String,
}

/// Input to [`crate::store::StoryStore::save_story`]. The caller supplies
/// every field, including `version_id` (conventionally 1 for a fresh
/// group) and `timestamp`.
#[derive(Debug, Clone)]
pub struct NewStoryVersion {
  pub title:      String,
  pub genre:      String,
  pub setting:    String,
  pub characters: String,
  pub themes:     String,
  pub details:    String,
  pub status:     String,
  pub timestamp:  String,
  pub content:    String,
  pub version_id: i64,
  pub user_id:    String,
}

/// The editable payload of [`crate::store::StoryStore::update_story`].
/// `version_id` and `timestamp` are assigned by the store; a changed
/// title or genre forks a new group rather than renaming the old one.
#[derive(Debug, Clone)]
pub struct StoryDraft {
  pub title:      String,
  pub genre:      String,
  pub setting:    String,
  pub characters: String,
  pub themes:     String,
  pub details:    String,
  pub status:     String,
  pub content:    String,
}

impl StoryDraft {
  pub fn group_key(&self) -> GroupKey {
    GroupKey {
      title: self.title.clone(),
      genre: self.genre.clone(),
    }
  }
}
