//! [`SqliteStore`] — the SQLite implementation of [`StoryStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params, params_from_iter};

use quill_core::{
  store::{StoryQuery, StoryStore},
  story::{NewStoryVersion, StoryDraft, StoryVersion},
  version::{COMPLETED, is_completed, next_version_id, sort_stories},
};

use crate::{Error, Result, schema::SCHEMA};

const COLUMNS: &str = "id, title, genre, setting, characters, themes, \
                       details, status, timestamp, content, version_id, user_id";

const INSERT: &str = "INSERT INTO stories (
     title, genre, setting, characters, themes, details,
     status, timestamp, content, version_id, user_id
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Quill story store backed by a single SQLite file.
///
/// Cheap to clone; the underlying connection handle is shared. Every call
/// runs to completion on the connection's dedicated thread, so the
/// read-then-write sequences below execute without interleaving even
/// under concurrent callers.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

fn story_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoryVersion> {
  Ok(StoryVersion {
    id:         row.get(0)?,
    title:      row.get(1)?,
    genre:      row.get(2)?,
    setting:    row.get(3)?,
    characters: row.get(4)?,
    themes:     row.get(5)?,
    details:    row.get(6)?,
    status:     row.get(7)?,
    timestamp:  row.get(8)?,
    content:    row.get(9)?,
    version_id: row.get(10)?,
    user_id:    row.get(11)?,
  })
}

fn get_by_id(
  conn: &rusqlite::Connection,
  id: i64,
) -> rusqlite::Result<Option<StoryVersion>> {
  conn
    .query_row(
      &format!("SELECT {COLUMNS} FROM stories WHERE id = ?1"),
      params![id],
      story_from_row,
    )
    .optional()
}

fn group_rows(
  conn: &rusqlite::Connection,
  title: &str,
  genre: &str,
  order: &str,
) -> rusqlite::Result<Vec<StoryVersion>> {
  let mut stmt = conn.prepare(&format!(
    "SELECT {COLUMNS} FROM stories WHERE title = ?1 AND genre = ?2 {order}"
  ))?;
  stmt
    .query_map(params![title, genre], story_from_row)?
    .collect()
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.code == rusqlite::ErrorCode::ConstraintViolation
  )
}

// ─── Operation outcomes ──────────────────────────────────────────────────────
// Domain failures travel out of the connection-thread closures as values;
// only infrastructure failures use the error channel.

enum SaveOutcome {
  Duplicate { title: String, genre: String, version_id: i64 },
  Saved(StoryVersion),
}

enum UpdateOutcome {
  Missing,
  Duplicate { title: String, genre: String, version_id: i64 },
  Saved(StoryVersion),
}

enum DeleteOutcome {
  Missing,
  Protected,
  Deleted,
}

enum HistoryOutcome {
  Missing,
  NoOriginal,
  Rows(Vec<StoryVersion>),
}

// ─── StoryStore impl ─────────────────────────────────────────────────────────

impl StoryStore for SqliteStore {
  async fn save_story(
    &self,
    new: NewStoryVersion,
  ) -> quill_core::Result<StoryVersion> {
    let outcome = self
      .conn
      .call(move |conn| {
        let inserted = conn.execute(
          INSERT,
          params![
            new.title,
            new.genre,
            new.setting,
            new.characters,
            new.themes,
            new.details,
            new.status,
            new.timestamp,
            new.content,
            new.version_id,
            new.user_id,
          ],
        );
        match inserted {
          Ok(_) => Ok(SaveOutcome::Saved(StoryVersion {
            id:         conn.last_insert_rowid(),
            title:      new.title,
            genre:      new.genre,
            setting:    new.setting,
            characters: new.characters,
            themes:     new.themes,
            details:    new.details,
            status:     new.status,
            timestamp:  new.timestamp,
            content:    new.content,
            version_id: new.version_id,
            user_id:    new.user_id,
          })),
          Err(e) if is_unique_violation(&e) => Ok(SaveOutcome::Duplicate {
            title:      new.title,
            genre:      new.genre,
            version_id: new.version_id,
          }),
          Err(e) => Err(e.into()),
        }
      })
      .await
      .map_err(Error::Database)?;

    match outcome {
      SaveOutcome::Saved(story) => Ok(story),
      SaveOutcome::Duplicate { title, genre, version_id } => {
        Err(quill_core::Error::VersionExists { title, genre, version_id })
      }
    }
  }

  async fn get_story(&self, id: i64) -> quill_core::Result<Option<StoryVersion>> {
    let story = self
      .conn
      .call(move |conn| Ok(get_by_id(conn, id)?))
      .await
      .map_err(Error::Database)?;
    Ok(story)
  }

  async fn list_latest(
    &self,
    query: &StoryQuery,
  ) -> quill_core::Result<Vec<StoryVersion>> {
    let title = query.title.clone();
    let genre = query.genre.clone();
    let status = query.status.clone();
    let (sort_key, sort_dir) = (query.sort_key, query.sort_dir);

    let mut stories = self
      .conn
      .call(move |conn| {
        // One row per group: the row holding the group's max version_id.
        let mut sql = format!(
          "SELECT s.id, s.title, s.genre, s.setting, s.characters, s.themes,
                  s.details, s.status, s.timestamp, s.content, s.version_id,
                  s.user_id
           FROM stories s
           JOIN (SELECT title, genre, MAX(version_id) AS max_version
                 FROM stories GROUP BY title, genre) g
             ON s.title = g.title
            AND s.genre = g.genre
            AND s.version_id = g.max_version"
        );

        let mut conds: Vec<String> = Vec::new();
        let mut args: Vec<String> = Vec::new();
        if let Some(t) = title {
          args.push(format!("%{}%", t.to_lowercase()));
          conds.push(format!("LOWER(s.title) LIKE ?{}", args.len()));
        }
        if let Some(g) = genre {
          args.push(g);
          conds.push(format!("s.genre = ?{}", args.len()));
        }
        if let Some(st) = status {
          args.push(st);
          conds.push(format!("s.status = ?{}", args.len()));
        }
        if !conds.is_empty() {
          sql.push_str(" WHERE ");
          sql.push_str(&conds.join(" AND "));
        }

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(params_from_iter(args), story_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::Database)?;

    sort_stories(&mut stories, sort_key, sort_dir);
    Ok(stories)
  }

  async fn update_story(
    &self,
    base_id: i64,
    draft: StoryDraft,
    user_id: String,
  ) -> quill_core::Result<StoryVersion> {
    let stamped = Utc::now().to_rfc3339();

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(base) = get_by_id(&tx, base_id)? else {
          return Ok(UpdateOutcome::Missing);
        };

        let incoming = draft.group_key();
        let current_max: Option<i64> = tx.query_row(
          "SELECT MAX(version_id) FROM stories WHERE title = ?1 AND genre = ?2",
          params![incoming.title, incoming.genre],
          |row| row.get(0),
        )?;
        let version_id =
          next_version_id(&base.group_key(), &incoming, current_max);

        let inserted = tx.execute(
          INSERT,
          params![
            draft.title,
            draft.genre,
            draft.setting,
            draft.characters,
            draft.themes,
            draft.details,
            draft.status,
            stamped,
            draft.content,
            version_id,
            user_id,
          ],
        );
        match inserted {
          Ok(_) => {
            let id = tx.last_insert_rowid();
            tx.commit()?;
            Ok(UpdateOutcome::Saved(StoryVersion {
              id,
              title: draft.title,
              genre: draft.genre,
              setting: draft.setting,
              characters: draft.characters,
              themes: draft.themes,
              details: draft.details,
              status: draft.status,
              timestamp: stamped,
              content: draft.content,
              version_id,
              user_id,
            }))
          }
          Err(e) if is_unique_violation(&e) => Ok(UpdateOutcome::Duplicate {
            title: draft.title,
            genre: draft.genre,
            version_id,
          }),
          Err(e) => Err(e.into()),
        }
      })
      .await
      .map_err(Error::Database)?;

    match outcome {
      UpdateOutcome::Saved(story) => Ok(story),
      UpdateOutcome::Missing => Err(quill_core::Error::StoryNotFound(base_id)),
      UpdateOutcome::Duplicate { title, genre, version_id } => {
        Err(quill_core::Error::VersionExists { title, genre, version_id })
      }
    }
  }

  async fn delete_version(&self, id: i64) -> quill_core::Result<()> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(row) = get_by_id(&tx, id)? else {
          return Ok(DeleteOutcome::Missing);
        };

        let siblings: i64 = tx.query_row(
          "SELECT COUNT(*) FROM stories WHERE title = ?1 AND genre = ?2",
          params![row.title, row.genre],
          |r| r.get(0),
        )?;
        if row.version_id == 1 && siblings > 1 {
          return Ok(DeleteOutcome::Protected);
        }

        tx.execute("DELETE FROM stories WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(DeleteOutcome::Deleted)
      })
      .await
      .map_err(Error::Database)?;

    match outcome {
      DeleteOutcome::Deleted => Ok(()),
      DeleteOutcome::Missing => Err(quill_core::Error::StoryNotFound(id)),
      DeleteOutcome::Protected => {
        Err(quill_core::Error::FirstVersionProtected(id))
      }
    }
  }

  async fn delete_group(&self, id: i64) -> quill_core::Result<()> {
    let found = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let Some(row) = get_by_id(&tx, id)? else {
          return Ok(false);
        };

        tx.execute(
          "DELETE FROM stories WHERE title = ?1 AND genre = ?2",
          params![row.title, row.genre],
        )?;
        tx.commit()?;
        Ok(true)
      })
      .await
      .map_err(Error::Database)?;

    if found {
      Ok(())
    } else {
      Err(quill_core::Error::StoryNotFound(id))
    }
  }

  async fn history(&self, id: i64) -> quill_core::Result<Vec<StoryVersion>> {
    let outcome = self
      .conn
      .call(move |conn| {
        let Some(row) = get_by_id(conn, id)? else {
          return Ok(HistoryOutcome::Missing);
        };

        let original = conn
          .query_row(
            &format!(
              "SELECT {COLUMNS} FROM stories
               WHERE title = ?1 AND genre = ?2 AND version_id = 1"
            ),
            params![row.title, row.genre],
            story_from_row,
          )
          .optional()?;
        let Some(original) = original else {
          return Ok(HistoryOutcome::NoOriginal);
        };

        if is_completed(&original.status) {
          // A finalized group collapses to its first completed row. The
          // status is re-queried rather than taken from `original`.
          let completed = conn
            .query_row(
              &format!(
                "SELECT {COLUMNS} FROM stories
                 WHERE title = ?1 AND genre = ?2 AND LOWER(status) = ?3
                 ORDER BY id LIMIT 1"
              ),
              params![row.title, row.genre, COMPLETED],
              story_from_row,
            )
            .optional()?;
          return Ok(HistoryOutcome::Rows(completed.into_iter().collect()));
        }

        let rows =
          group_rows(conn, &row.title, &row.genre, "ORDER BY version_id DESC")?;
        Ok(HistoryOutcome::Rows(rows))
      })
      .await
      .map_err(Error::Database)?;

    match outcome {
      HistoryOutcome::Rows(rows) => Ok(rows),
      HistoryOutcome::Missing => Err(quill_core::Error::StoryNotFound(id)),
      HistoryOutcome::NoOriginal => {
        Err(quill_core::Error::OriginalNotFound(id))
      }
    }
  }
}
