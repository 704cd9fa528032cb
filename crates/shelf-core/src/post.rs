//! Feed records: activities, status updates and book reviews, plus the read
//! models the feed pages are assembled from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::User;

// ─── Records ─────────────────────────────────────────────────────────────────

/// Something a user did with a book (shelved it, finished it, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
  pub activity_id:   i64,
  pub user_id:       i64,
  /// Free-form category label, e.g. `"finished"` or `"want-to-read"`.
  pub category:      Option<String>,
  pub activity_text: String,
  pub created_at:    DateTime<Utc>,
}

/// A free-text status update posted by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
  pub status_id:   i64,
  pub user_id:     i64,
  pub status_text: String,
  pub created_at:  DateTime<Utc>,
}

/// A user's review of a catalog work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
  pub review_id:   i64,
  pub user_id:     i64,
  /// Catalog work key, e.g. `"OL45804W"`.
  pub book_id:     String,
  pub review_text: String,
  pub created_at:  DateTime<Utc>,
}

// ─── Inputs ──────────────────────────────────────────────────────────────────

/// Input for [`SocialStore::record_activity`](crate::store::SocialStore::record_activity).
/// `created_at` is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewActivity {
  pub user_id:       i64,
  pub category:      Option<String>,
  pub activity_text: String,
}

/// Input for [`SocialStore::record_review`](crate::store::SocialStore::record_review).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewReview {
  pub user_id:     i64,
  pub book_id:     String,
  pub review_text: String,
}

// ─── Read models ─────────────────────────────────────────────────────────────

/// An activity with its author and the ids of every user who likes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityEntry {
  pub activity: Activity,
  pub author:   User,
  pub liked_by: Vec<i64>,
}

/// A status with its author and the ids of every user who likes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
  pub status:   Status,
  pub author:   User,
  pub liked_by: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewEntry {
  pub review: Review,
  pub author: User,
}
