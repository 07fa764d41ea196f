//! Error type for `quill-gen`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("provider returned {status}: {message}")]
  Api { status: u16, message: String },

  #[error("provider response contained no content")]
  EmptyResponse,
}

impl From<Error> for quill_core::Error {
  fn from(e: Error) -> Self {
    quill_core::Error::Generation(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
