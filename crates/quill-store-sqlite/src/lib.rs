//! SQLite backend for the Quill story store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. The version-group rules
//! (fork-or-increment, first-version protection, history collapse) run
//! inside single transactions on that thread, so concurrent edits of one
//! group cannot race on a version number.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
