//! The `SocialStore` trait: the persistence collaborator.
//!
//! Implemented by storage backends (e.g. `shelf-store-sqlite`). The like
//! service and the HTTP layer depend on this abstraction, never on a concrete
//! backend.

use std::future::Future;

use crate::{
  book::{Book, Category, Favourite, NewShelfEntry, ShelvedBook},
  like::{LikeAggregate, LikeTarget},
  post::{
    Activity, ActivityEntry, NewActivity, NewReview, Review, ReviewEntry, Status,
    StatusEntry,
  },
  user::User,
};

/// Abstraction over a Shelf storage backend.
///
/// All methods return `Send` futures so the trait can be used from axum
/// handlers on a multi-threaded runtime.
pub trait SocialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user. Fails if the username is already taken.
  fn create_user<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + 'a;

  fn find_user_by_username<'a>(
    &'a self,
    username: &'a str,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + 'a;

  // ── Activities ────────────────────────────────────────────────────────

  fn record_activity(
    &self,
    input: NewActivity,
  ) -> impl Future<Output = Result<Activity, Self::Error>> + Send + '_;

  fn find_activity_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Activity>, Self::Error>> + Send + '_;

  /// The newest `limit` activities, newest first, with likes attached.
  fn list_activities(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ActivityEntry>, Self::Error>> + Send + '_;

  // ── Statuses ──────────────────────────────────────────────────────────

  fn post_status(
    &self,
    user_id: i64,
    text: String,
  ) -> impl Future<Output = Result<Status, Self::Error>> + Send + '_;

  fn find_status_by_id(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<Status>, Self::Error>> + Send + '_;

  /// Every status, newest first, with likes attached.
  fn list_statuses(
    &self,
  ) -> impl Future<Output = Result<Vec<StatusEntry>, Self::Error>> + Send + '_;

  // ── Likes ─────────────────────────────────────────────────────────────

  /// The aggregate for exactly this target, or `None` if nobody has liked it
  /// yet. Never returns the aggregate of a target of the other kind.
  fn find_like_aggregate(
    &self,
    target: LikeTarget,
  ) -> impl Future<Output = Result<Option<LikeAggregate>, Self::Error>> + Send + '_;

  /// Create the aggregate for `target` with a single member.
  fn create_like_aggregate(
    &self,
    target: LikeTarget,
    initial_member: i64,
  ) -> impl Future<Output = Result<LikeAggregate, Self::Error>> + Send + '_;

  /// Add `user_id` to the aggregate. Set semantics: adding an existing
  /// member is a no-op.
  fn add_member(
    &self,
    like_id: i64,
    user_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Remove `user_id` from the aggregate. Removing a non-member is a no-op.
  fn remove_member(
    &self,
    like_id: i64,
    user_id: i64,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Reviews ───────────────────────────────────────────────────────────

  fn record_review(
    &self,
    input: NewReview,
  ) -> impl Future<Output = Result<Review, Self::Error>> + Send + '_;

  /// Every review with its author, newest first.
  fn list_reviews(
    &self,
  ) -> impl Future<Output = Result<Vec<ReviewEntry>, Self::Error>> + Send + '_;

  // ── Books ─────────────────────────────────────────────────────────────

  /// Create a shelf category. Fails if the name is already taken.
  fn create_category<'a>(
    &'a self,
    name: &'a str,
  ) -> impl Future<Output = Result<Category, Self::Error>> + Send + 'a;

  /// Put a book on a user's shelf, recording the book itself if it is new.
  /// Re-shelving replaces the entry's categories.
  fn shelve_book(
    &self,
    entry: NewShelfEntry,
  ) -> impl Future<Output = Result<ShelvedBook, Self::Error>> + Send + '_;

  /// Every book on the user's shelf, most recently shelved first.
  fn list_user_books(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<ShelvedBook>, Self::Error>> + Send + '_;

  /// Mark a book as a favourite. Set semantics: favouriting twice is a no-op.
  fn add_favourite(
    &self,
    user_id: i64,
    book: Book,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The user's favourites, most recent first.
  fn list_favourites(
    &self,
    user_id: i64,
  ) -> impl Future<Output = Result<Vec<Favourite>, Self::Error>> + Send + '_;
}
