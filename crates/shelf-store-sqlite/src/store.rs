//! [`SqliteStore`] — the SQLite implementation of [`SocialStore`].

use std::{collections::BTreeSet, path::Path};

use chrono::{DateTime, SubsecRound as _, Utc};
use rusqlite::OptionalExtension as _;

use shelf_core::{
  book::{Book, Category, Favourite, NewShelfEntry, ShelvedBook},
  like::{LikeAggregate, LikeTarget},
  post::{
    Activity, ActivityEntry, NewActivity, NewReview, Review, ReviewEntry, Status,
    StatusEntry,
  },
  store::SocialStore,
  user::User,
};

use crate::{
  Result,
  encode::{
    RawActivity, RawBookRow, RawReview, RawStatus, decode_dt, decode_target, encode_dt,
    group_members, target_column,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Shelf store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
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

  /// Open an in-memory store, for tests.
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

  /// `(activity_id, user_id)` for every member of a like on one of the
  /// newest `limit` activities, i.e. the activities `list_activities` returns.
  fn activity_member_pairs(
    conn: &rusqlite::Connection,
    limit: i64,
  ) -> rusqlite::Result<Vec<(i64, i64)>> {
    let mut stmt = conn.prepare(
      "SELECT l.activity_id, m.user_id
       FROM likes l
       JOIN like_members m ON m.like_id = l.like_id
       WHERE l.activity_id IN (
         SELECT activity_id FROM activities
         ORDER BY created_at DESC, activity_id DESC
         LIMIT ?1
       )
       ORDER BY m.user_id",
    )?;
    let pairs = stmt
      .query_map(rusqlite::params![limit], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pairs)
  }

  /// Record `book`, refreshing its title if the work is already known.
  fn upsert_book(conn: &rusqlite::Connection, book_id: &str, title: &str) -> rusqlite::Result<()> {
    conn.execute(
      "INSERT INTO books (book_id, title) VALUES (?1, ?2)
       ON CONFLICT (book_id) DO UPDATE SET title = excluded.title",
      rusqlite::params![book_id, title],
    )?;
    Ok(())
  }

  /// `(status_id, user_id)` for every member of every status like.
  fn status_member_pairs(conn: &rusqlite::Connection) -> rusqlite::Result<Vec<(i64, i64)>> {
    let mut stmt = conn.prepare(
      "SELECT l.status_id, m.user_id
       FROM likes l
       JOIN like_members m ON m.like_id = l.like_id
       WHERE l.status_id IS NOT NULL
       ORDER BY m.user_id",
    )?;
    let pairs = stmt
      .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
      .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(pairs)
  }
}

/// The current time at the precision timestamps are stored with, so a record
/// returned by a write equals the same record read back.
fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

// ─── SocialStore impl ────────────────────────────────────────────────────────

impl SocialStore for SqliteStore {
  type Error = crate::Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, username: &str) -> Result<User> {
    let name = username.to_owned();

    let user_id = self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO users (username) VALUES (?1)", rusqlite::params![name])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(User { user_id, username: username.to_owned() })
  }

  async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
    let name = username.to_owned();

    let user = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username FROM users WHERE username = ?1",
            rusqlite::params![name],
            |row| Ok(User { user_id: row.get(0)?, username: row.get(1)? }),
          )
          .optional()?)
      })
      .await?;

    Ok(user)
  }

  // ── Activities ────────────────────────────────────────────────────────────

  async fn record_activity(&self, input: NewActivity) -> Result<Activity> {
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let category   = input.category.clone();
    let text       = input.activity_text.clone();
    let user_id    = input.user_id;

    let activity_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO activities (user_id, category, activity_text, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, category, text, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Activity {
      activity_id,
      user_id,
      category: input.category,
      activity_text: input.activity_text,
      created_at,
    })
  }

  async fn find_activity_by_id(&self, id: i64) -> Result<Option<Activity>> {
    let raw: Option<RawActivity> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT activity_id, user_id, category, activity_text, created_at
             FROM activities WHERE activity_id = ?1",
            rusqlite::params![id],
            |row| RawActivity::from_row(row, false),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawActivity::into_activity).transpose()
  }

  async fn list_activities(&self, limit: usize) -> Result<Vec<ActivityEntry>> {
    let limit_val = limit as i64;

    let (raws, pairs): (Vec<RawActivity>, Vec<(i64, i64)>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT a.activity_id, a.user_id, a.category, a.activity_text, a.created_at,
                  u.username
           FROM activities a
           JOIN users u ON u.user_id = a.user_id
           ORDER BY a.created_at DESC, a.activity_id DESC
           LIMIT ?1",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![limit_val], |row| RawActivity::from_row(row, true))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let pairs = Self::activity_member_pairs(conn, limit_val)?;
        Ok((rows, pairs))
      })
      .await?;

    let mut likes = group_members(pairs);
    raws.into_iter().map(|raw| raw.into_entry(&mut likes)).collect()
  }

  // ── Statuses ──────────────────────────────────────────────────────────────

  async fn post_status(&self, user_id: i64, text: String) -> Result<Status> {
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let text_col   = text.clone();

    let status_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO statuses (user_id, status_text, created_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, text_col, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Status { status_id, user_id, status_text: text, created_at })
  }

  async fn find_status_by_id(&self, id: i64) -> Result<Option<Status>> {
    let raw: Option<RawStatus> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT status_id, user_id, status_text, created_at
             FROM statuses WHERE status_id = ?1",
            rusqlite::params![id],
            |row| RawStatus::from_row(row, false),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawStatus::into_status).transpose()
  }

  async fn list_statuses(&self) -> Result<Vec<StatusEntry>> {
    let (raws, pairs): (Vec<RawStatus>, Vec<(i64, i64)>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT s.status_id, s.user_id, s.status_text, s.created_at, u.username
           FROM statuses s
           JOIN users u ON u.user_id = s.user_id
           ORDER BY s.created_at DESC, s.status_id DESC",
        )?;
        let rows = stmt
          .query_map([], |row| RawStatus::from_row(row, true))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        let pairs = Self::status_member_pairs(conn)?;
        Ok((rows, pairs))
      })
      .await?;

    let mut likes = group_members(pairs);
    raws.into_iter().map(|raw| raw.into_entry(&mut likes)).collect()
  }

  // ── Likes ─────────────────────────────────────────────────────────────────

  async fn find_like_aggregate(&self, target: LikeTarget) -> Result<Option<LikeAggregate>> {
    let (column, target_id) = target_column(target);

    type Row = (i64, Option<i64>, Option<i64>, BTreeSet<i64>);
    let row: Option<Row> = self
      .conn
      .call(move |conn| {
        let head: Option<(i64, Option<i64>, Option<i64>)> = conn
          .query_row(
            &format!("SELECT like_id, activity_id, status_id FROM likes WHERE {column} = ?1"),
            rusqlite::params![target_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
          )
          .optional()?;

        let Some((like_id, activity_id, status_id)) = head else {
          return Ok(None);
        };

        let mut stmt = conn.prepare("SELECT user_id FROM like_members WHERE like_id = ?1")?;
        let members = stmt
          .query_map(rusqlite::params![like_id], |row| row.get(0))?
          .collect::<rusqlite::Result<BTreeSet<i64>>>()?;

        Ok(Some((like_id, activity_id, status_id, members)))
      })
      .await?;

    row
      .map(|(like_id, activity_id, status_id, liked_by)| {
        Ok(LikeAggregate {
          like_id,
          target: decode_target(like_id, activity_id, status_id)?,
          liked_by,
        })
      })
      .transpose()
  }

  async fn create_like_aggregate(
    &self,
    target:         LikeTarget,
    initial_member: i64,
  ) -> Result<LikeAggregate> {
    let (column, target_id) = target_column(target);

    let like_id = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          &format!("INSERT INTO likes ({column}) VALUES (?1)"),
          rusqlite::params![target_id],
        )?;
        let like_id = tx.last_insert_rowid();
        tx.execute(
          "INSERT INTO like_members (like_id, user_id) VALUES (?1, ?2)",
          rusqlite::params![like_id, initial_member],
        )?;
        tx.commit()?;
        Ok(like_id)
      })
      .await?;

    Ok(LikeAggregate { like_id, target, liked_by: BTreeSet::from([initial_member]) })
  }

  async fn add_member(&self, like_id: i64, user_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR IGNORE INTO like_members (like_id, user_id) VALUES (?1, ?2)",
          rusqlite::params![like_id, user_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn remove_member(&self, like_id: i64, user_id: i64) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "DELETE FROM like_members WHERE like_id = ?1 AND user_id = ?2",
          rusqlite::params![like_id, user_id],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Reviews ───────────────────────────────────────────────────────────────

  async fn record_review(&self, input: NewReview) -> Result<Review> {
    let created_at = now();
    let at_str     = encode_dt(created_at);
    let book_id    = input.book_id.clone();
    let text       = input.review_text.clone();
    let user_id    = input.user_id;

    let review_id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reviews (user_id, book_id, review_text, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, book_id, text, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Review {
      review_id,
      user_id,
      book_id: input.book_id,
      review_text: input.review_text,
      created_at,
    })
  }

  async fn list_reviews(&self) -> Result<Vec<ReviewEntry>> {
    let raws: Vec<RawReview> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT r.review_id, r.user_id, r.book_id, r.review_text, r.created_at, u.username
           FROM reviews r
           JOIN users u ON u.user_id = r.user_id
           ORDER BY r.created_at DESC, r.review_id DESC",
        )?;
        let rows = stmt
          .query_map([], RawReview::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReview::into_entry).collect()
  }

  // ── Books ─────────────────────────────────────────────────────────────────

  async fn create_category(&self, name: &str) -> Result<Category> {
    let name_col = name.to_owned();

    let category_id = self
      .conn
      .call(move |conn| {
        conn.execute("INSERT INTO categories (name) VALUES (?1)", rusqlite::params![name_col])?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Category { category_id, name: name.to_owned() })
  }

  async fn shelve_book(&self, entry: NewShelfEntry) -> Result<ShelvedBook> {
    let at_str = encode_dt(now());
    let NewShelfEntry { user_id, book, mut category_ids } = entry;
    category_ids.sort_unstable();
    category_ids.dedup();

    let book_id    = book.book_id.clone();
    let title      = book.title.clone();
    let categories = category_ids.clone();

    let shelved_at: String = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        Self::upsert_book(&tx, &book_id, &title)?;
        tx.execute(
          "INSERT OR IGNORE INTO shelves (user_id, book_id, shelved_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, book_id, at_str],
        )?;
        tx.execute(
          "DELETE FROM shelf_categories WHERE user_id = ?1 AND book_id = ?2",
          rusqlite::params![user_id, book_id],
        )?;
        for category_id in &categories {
          tx.execute(
            "INSERT INTO shelf_categories (user_id, book_id, category_id) VALUES (?1, ?2, ?3)",
            rusqlite::params![user_id, book_id, category_id],
          )?;
        }
        let shelved_at = tx.query_row(
          "SELECT shelved_at FROM shelves WHERE user_id = ?1 AND book_id = ?2",
          rusqlite::params![user_id, book_id],
          |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(shelved_at)
      })
      .await?;

    Ok(ShelvedBook { book, category_ids, shelved_at: decode_dt(&shelved_at)? })
  }

  async fn list_user_books(&self, user_id: i64) -> Result<Vec<ShelvedBook>> {
    let (raws, pairs): (Vec<RawBookRow>, Vec<(String, i64)>) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.book_id, b.title, s.shelved_at
           FROM shelves s
           JOIN books b ON b.book_id = s.book_id
           WHERE s.user_id = ?1
           ORDER BY s.shelved_at DESC, s.rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawBookRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
          "SELECT book_id, category_id FROM shelf_categories
           WHERE user_id = ?1
           ORDER BY category_id",
        )?;
        let pairs = stmt
          .query_map(rusqlite::params![user_id], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((rows, pairs))
      })
      .await?;

    let mut categories = group_members(pairs);
    raws.into_iter().map(|raw| raw.into_shelved(&mut categories)).collect()
  }

  async fn add_favourite(&self, user_id: i64, book: Book) -> Result<()> {
    let at_str = encode_dt(now());

    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        Self::upsert_book(&tx, &book.book_id, &book.title)?;
        tx.execute(
          "INSERT OR IGNORE INTO favourites (user_id, book_id, favourited_at) VALUES (?1, ?2, ?3)",
          rusqlite::params![user_id, book.book_id, at_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_favourites(&self, user_id: i64) -> Result<Vec<Favourite>> {
    let raws: Vec<RawBookRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT b.book_id, b.title, f.favourited_at
           FROM favourites f
           JOIN books b ON b.book_id = f.book_id
           WHERE f.user_id = ?1
           ORDER BY f.favourited_at DESC, f.rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![user_id], RawBookRow::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawBookRow::into_favourite).collect()
  }
}
