//! OpenAI-compatible generation backend for Quill.
//!
//! Implements [`quill_core::generate::StoryGenerator`] against any
//! provider exposing the OpenAI chat-completions and image-generation
//! endpoints. Prompt construction and response post-processing live in
//! [`prompt`]; the HTTP plumbing lives in [`client`].

mod client;
mod prompt;

pub mod error;

pub use client::{GeneratorConfig, OpenAiGenerator};
pub use error::{Error, Result};
