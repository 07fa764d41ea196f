//! Version-group rules: fork-or-increment, finalized groups, and the
//! date-aware ordering used by listings.
//!
//! These are pure functions; the store backends apply them inside their
//! own transaction boundaries.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::story::{GroupKey, StoryVersion};

/// Status value that finalizes a group, compared case-insensitively.
pub const COMPLETED: &str = "completed";

pub fn is_completed(status: &str) -> bool {
  status.eq_ignore_ascii_case(COMPLETED)
}

/// Decide the version number for an edit based from a row of group `base`.
///
/// A changed key forks a brand-new group at version 1, leaving the old
/// group untouched. An unchanged key continues the group after its current
/// maximum; a group with no rows counts as maximum 0, so the new version
/// becomes 1.
pub fn next_version_id(
  base: &GroupKey,
  incoming: &GroupKey,
  current_max: Option<i64>,
) -> i64 {
  if base != incoming {
    1
  } else {
    current_max.unwrap_or(0) + 1
  }
}

// ─── Listing order ───────────────────────────────────────────────────────────

/// Sort key for listings. Anything unrecognised falls back to timestamp.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
  #[default]
  Timestamp,
  Title,
  Genre,
}

impl SortKey {
  /// Parse a query parameter; unknown or absent keys fall back to
  /// timestamp.
  pub fn from_param(param: Option<&str>) -> Self {
    match param {
      Some("title") => Self::Title,
      Some("genre") => Self::Genre,
      _ => Self::Timestamp,
    }
  }
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
  Asc,
  #[default]
  Desc,
}

impl SortDir {
  /// Absent means descending; any present value other than `desc`
  /// (case-insensitive) sorts ascending.
  pub fn from_param(param: Option<&str>) -> Self {
    match param {
      None => Self::Desc,
      Some(v) if v.eq_ignore_ascii_case("desc") => Self::Desc,
      Some(_) => Self::Asc,
    }
  }
}

/// Parse a stored timestamp leniently: RFC 3339 first, then the common
/// unzoned date-time shapes, then a bare date (midnight UTC). Returns
/// `None` for text no format matches.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
    return Some(dt.with_timezone(&Utc));
  }
  for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(naive.and_utc());
    }
  }
  if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
    return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
  }
  None
}

/// Sort a listing in place.
///
/// Timestamp ordering compares parsed date-times, so rows with mixed text
/// formats still order chronologically; unparseable values sort before
/// every real date. `id` breaks ties to keep the order total.
pub fn sort_stories(stories: &mut [StoryVersion], key: SortKey, dir: SortDir) {
  stories.sort_by(|a, b| {
    let ord = match key {
      SortKey::Timestamp => {
        parse_timestamp(&a.timestamp).cmp(&parse_timestamp(&b.timestamp))
      }
      SortKey::Title => a.title.cmp(&b.title),
      SortKey::Genre => a.genre.cmp(&b.genre),
    };
    let ord = ord.then_with(|| a.id.cmp(&b.id));
    match dir {
      SortDir::Asc => ord,
      SortDir::Desc => ord.reverse(),
    }
  });
}

#[cfg(test)]
mod tests {
  use super::*;

  fn key(title: &str, genre: &str) -> GroupKey {
    GroupKey {
      title: title.to_string(),
      genre: genre.to_string(),
    }
  }

  fn story(id: i64, timestamp: &str, title: &str) -> StoryVersion {
    StoryVersion {
      id,
      title: title.to_string(),
      genre: "Fantasy".to_string(),
      setting: String::new(),
      characters: String::new(),
      themes: String::new(),
      details: String::new(),
      status: "draft".to_string(),
      timestamp: timestamp.to_string(),
      content: String::new(),
      version_id: 1,
      user_id: String::new(),
    }
  }

  #[test]
  fn same_key_increments_from_current_max() {
    let base = key("Alpha", "Fantasy");
    assert_eq!(next_version_id(&base, &base.clone(), Some(3)), 4);
  }

  #[test]
  fn empty_group_continues_at_one() {
    let base = key("Alpha", "Fantasy");
    assert_eq!(next_version_id(&base, &base.clone(), None), 1);
  }

  #[test]
  fn changed_title_forks_at_one() {
    let base = key("Alpha", "Fantasy");
    assert_eq!(next_version_id(&base, &key("Beta", "Fantasy"), Some(7)), 1);
  }

  #[test]
  fn changed_genre_forks_at_one() {
    let base = key("Alpha", "Fantasy");
    assert_eq!(next_version_id(&base, &key("Alpha", "Horror"), Some(7)), 1);
  }

  #[test]
  fn completed_matches_any_case() {
    assert!(is_completed("completed"));
    assert!(is_completed("Completed"));
    assert!(is_completed("COMPLETED"));
    assert!(!is_completed("draft"));
    assert!(!is_completed("complete"));
  }

  #[test]
  fn sort_params_fall_back() {
    assert_eq!(SortKey::from_param(None), SortKey::Timestamp);
    assert_eq!(SortKey::from_param(Some("genre")), SortKey::Genre);
    assert_eq!(SortKey::from_param(Some("wordcount")), SortKey::Timestamp);
    assert_eq!(SortDir::from_param(None), SortDir::Desc);
    assert_eq!(SortDir::from_param(Some("DESC")), SortDir::Desc);
    assert_eq!(SortDir::from_param(Some("ascending")), SortDir::Asc);
  }

  #[test]
  fn parses_mixed_timestamp_formats() {
    assert!(parse_timestamp("2026-01-10T09:30:00Z").is_some());
    assert!(parse_timestamp("2026-01-10T09:30:00+01:00").is_some());
    assert!(parse_timestamp("2026-01-10 09:30:00").is_some());
    assert!(parse_timestamp("2026-01-10").is_some());
    assert!(parse_timestamp("last tuesday").is_none());
  }

  #[test]
  fn timestamp_sort_compares_dates_not_strings() {
    // As raw strings "2026-01-09 23:00:00" > "2026-01-10T08:00:00Z"
    // would be false by collation accident; as dates the order is clear.
    let mut rows = vec![
      story(1, "2026-01-10T08:00:00Z", "a"),
      story(2, "2026-01-09 23:00:00", "b"),
      story(3, "2026-01-11", "c"),
    ];
    sort_stories(&mut rows, SortKey::Timestamp, SortDir::Asc);
    let ids: Vec<i64> = rows.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![2, 1, 3]);

    sort_stories(&mut rows, SortKey::Timestamp, SortDir::Desc);
    let ids: Vec<i64> = rows.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![3, 1, 2]);
  }

  #[test]
  fn unparseable_timestamps_sort_first() {
    let mut rows = vec![
      story(1, "2026-01-10T08:00:00Z", "a"),
      story(2, "whenever", "b"),
    ];
    sort_stories(&mut rows, SortKey::Timestamp, SortDir::Asc);
    assert_eq!(rows[0].id, 2);
  }

  #[test]
  fn title_sort_is_plain_string_order() {
    let mut rows = vec![
      story(1, "2026-01-10", "banana"),
      story(2, "2026-01-10", "Apple"),
    ];
    sort_stories(&mut rows, SortKey::Title, SortDir::Asc);
    assert_eq!(rows[0].id, 2);
  }
}
