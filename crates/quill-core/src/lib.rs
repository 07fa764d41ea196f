//! Core types and trait definitions for the Quill story service.
//!
//! Everything here is plain data and trait seams: no HTTP, no database.
//! Every other crate in the workspace depends on this one.

pub mod error;
pub mod generate;
pub mod store;
pub mod story;
pub mod version;

pub use error::{Error, Result};
