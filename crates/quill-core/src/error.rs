//! The error taxonomy shared by the store and generator traits.
//!
//! Every operation either returns a full valid result or one of these
//! failures; nothing is retried and nothing is swallowed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("story not found: {0}")]
  StoryNotFound(i64),

  /// The group reached from an existing row has no version-1 anchor.
  /// Indicates upstream corruption; surfaced as a hard not-found with no
  /// repair attempt.
  #[error("original version not found for story {0}")]
  OriginalNotFound(i64),

  /// The row is its group's first version and later versions still
  /// exist; deleting it would orphan the group's anchor.
  #[error("story {0} is the first version of its group and cannot be deleted while later versions exist")]
  FirstVersionProtected(i64),

  #[error("version {version_id} of {title:?} ({genre}) already exists")]
  VersionExists {
    title:      String,
    genre:      String,
    version_id: i64,
  },

  #[error("storage error: {0}")]
  Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("generation error: {0}")]
  Generation(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
