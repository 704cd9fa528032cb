//! Encoding and decoding helpers between Shelf domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings so that ordering by
//! the text column is chronological. Ids are native SQLite integers.

use std::{collections::HashMap, hash::Hash};

use chrono::{DateTime, SecondsFormat, Utc};
use shelf_core::{
  book::{Book, Favourite, ShelvedBook},
  like::LikeTarget,
  post::{Activity, ActivityEntry, Review, ReviewEntry, Status, StatusEntry},
  user::User,
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339_opts(SecondsFormat::Micros, true) }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── LikeTarget ──────────────────────────────────────────────────────────────

/// The `likes` column that identifies `target`, and its value.
pub fn target_column(target: LikeTarget) -> (&'static str, i64) {
  match target {
    LikeTarget::Activity(id) => ("activity_id", id),
    LikeTarget::Status(id) => ("status_id", id),
  }
}

pub fn decode_target(
  like_id: i64,
  activity_id: Option<i64>,
  status_id: Option<i64>,
) -> Result<LikeTarget> {
  match (activity_id, status_id) {
    (Some(id), None) => Ok(LikeTarget::Activity(id)),
    (None, Some(id)) => Ok(LikeTarget::Status(id)),
    _ => Err(Error::AmbiguousTarget(like_id)),
  }
}

/// Group `(key, id)` pairs into a map of key to ids, keeping pair order.
/// Used for like members per target and category ids per shelved book.
pub fn group_members<K: Eq + Hash>(pairs: Vec<(K, i64)>) -> HashMap<K, Vec<i64>> {
  let mut map: HashMap<K, Vec<i64>> = HashMap::new();
  for (key, id) in pairs {
    map.entry(key).or_default().push(id);
  }
  map
}

// ─── Raw rows ────────────────────────────────────────────────────────────────
//
// Raw rows carry undecoded column values out of the connection closure;
// decoding happens on the async side so it can use the crate's error type.

pub struct RawActivity {
  pub activity_id:   i64,
  pub user_id:       i64,
  pub category:      Option<String>,
  pub activity_text: String,
  pub created_at:    String,
  pub username:      String,
}

impl RawActivity {
  /// Columns: activity_id, user_id, category, activity_text, created_at,
  /// and optionally the author's username at index 5.
  pub fn from_row(row: &rusqlite::Row<'_>, with_author: bool) -> rusqlite::Result<Self> {
    Ok(Self {
      activity_id:   row.get(0)?,
      user_id:       row.get(1)?,
      category:      row.get(2)?,
      activity_text: row.get(3)?,
      created_at:    row.get(4)?,
      username:      if with_author { row.get(5)? } else { String::new() },
    })
  }

  pub fn into_activity(self) -> Result<Activity> {
    Ok(Activity {
      activity_id:   self.activity_id,
      user_id:       self.user_id,
      category:      self.category,
      activity_text: self.activity_text,
      created_at:    decode_dt(&self.created_at)?,
    })
  }

  pub fn into_entry(self, likes: &mut HashMap<i64, Vec<i64>>) -> Result<ActivityEntry> {
    let author = User { user_id: self.user_id, username: self.username.clone() };
    let liked_by = likes.remove(&self.activity_id).unwrap_or_default();
    Ok(ActivityEntry { activity: self.into_activity()?, author, liked_by })
  }
}

pub struct RawStatus {
  pub status_id:   i64,
  pub user_id:     i64,
  pub status_text: String,
  pub created_at:  String,
  pub username:    String,
}

impl RawStatus {
  /// Columns: status_id, user_id, status_text, created_at, and optionally
  /// the author's username at index 4.
  pub fn from_row(row: &rusqlite::Row<'_>, with_author: bool) -> rusqlite::Result<Self> {
    Ok(Self {
      status_id:   row.get(0)?,
      user_id:     row.get(1)?,
      status_text: row.get(2)?,
      created_at:  row.get(3)?,
      username:    if with_author { row.get(4)? } else { String::new() },
    })
  }

  pub fn into_status(self) -> Result<Status> {
    Ok(Status {
      status_id:   self.status_id,
      user_id:     self.user_id,
      status_text: self.status_text,
      created_at:  decode_dt(&self.created_at)?,
    })
  }

  pub fn into_entry(self, likes: &mut HashMap<i64, Vec<i64>>) -> Result<StatusEntry> {
    let author = User { user_id: self.user_id, username: self.username.clone() };
    let liked_by = likes.remove(&self.status_id).unwrap_or_default();
    Ok(StatusEntry { status: self.into_status()?, author, liked_by })
  }
}

pub struct RawReview {
  pub review_id:   i64,
  pub user_id:     i64,
  pub book_id:     String,
  pub review_text: String,
  pub created_at:  String,
  pub username:    String,
}

impl RawReview {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      review_id:   row.get(0)?,
      user_id:     row.get(1)?,
      book_id:     row.get(2)?,
      review_text: row.get(3)?,
      created_at:  row.get(4)?,
      username:    row.get(5)?,
    })
  }

  pub fn into_entry(self) -> Result<ReviewEntry> {
    Ok(ReviewEntry {
      author: User { user_id: self.user_id, username: self.username },
      review: Review {
        review_id:   self.review_id,
        user_id:     self.user_id,
        book_id:     self.book_id,
        review_text: self.review_text,
        created_at:  decode_dt(&self.created_at)?,
      },
    })
  }
}

/// Columns: book_id, title, and the shelf or favourite timestamp.
pub struct RawBookRow {
  pub book_id: String,
  pub title:   String,
  pub at:      String,
}

impl RawBookRow {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { book_id: row.get(0)?, title: row.get(1)?, at: row.get(2)? })
  }

  pub fn into_shelved(self, categories: &mut HashMap<String, Vec<i64>>) -> Result<ShelvedBook> {
    let category_ids = categories.remove(&self.book_id).unwrap_or_default();
    Ok(ShelvedBook {
      shelved_at: decode_dt(&self.at)?,
      book: Book { book_id: self.book_id, title: self.title },
      category_ids,
    })
  }

  pub fn into_favourite(self) -> Result<Favourite> {
    Ok(Favourite {
      favourited_at: decode_dt(&self.at)?,
      book:          Book { book_id: self.book_id, title: self.title },
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encoded_timestamps_sort_chronologically() {
    let a = DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z").unwrap().with_timezone(&Utc);
    let b = DateTime::parse_from_rfc3339("2024-05-01T12:00:00.5Z").unwrap().with_timezone(&Utc);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn target_columns_are_exclusive() {
    assert_eq!(decode_target(1, Some(4), None).unwrap(), LikeTarget::Activity(4));
    assert_eq!(decode_target(1, None, Some(4)).unwrap(), LikeTarget::Status(4));
    assert!(matches!(decode_target(9, Some(1), Some(2)), Err(Error::AmbiguousTarget(9))));
    assert!(matches!(decode_target(9, None, None), Err(Error::AmbiguousTarget(9))));
  }
}
