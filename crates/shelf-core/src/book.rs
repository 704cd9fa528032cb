//! Books a user keeps: their shelf, with per-book category labels, and their
//! favourites.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A shelf label such as `"reading"` or `"finished"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
  pub category_id: i64,
  pub name:        String,
}

/// A catalog work as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
  /// Catalog work key, e.g. `"OL45804W"`.
  pub book_id: String,
  pub title:   String,
}

/// A book on a user's shelf with the ids of the categories it is filed
/// under, in ascending order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShelvedBook {
  #[serde(flatten)]
  pub book:         Book,
  pub category_ids: Vec<i64>,
  pub shelved_at:   DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favourite {
  #[serde(flatten)]
  pub book:          Book,
  pub favourited_at: DateTime<Utc>,
}

/// Input for [`SocialStore::shelve_book`](crate::store::SocialStore::shelve_book).
///
/// Shelving a book that is already on the shelf replaces its categories and
/// keeps the original `shelved_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShelfEntry {
  pub user_id:      i64,
  pub book:         Book,
  pub category_ids: Vec<i64>,
}
