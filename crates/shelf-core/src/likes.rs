//! [`LikeService`]: toggles a user's like on an activity or status.
//!
//! A toggle is a read-modify-write against the store: look up the target's
//! aggregate, then create it, add the user, or remove the user. Toggles on
//! the same target are serialized through a [`LockTable`] so two concurrent
//! toggles can never both observe "not liked". Every successful call performs
//! exactly one store write; failures perform none.

use std::sync::Arc;

use tracing::{debug, info};

use crate::{
  Error, Result,
  like::{LikeTarget, Toggle},
  locks::LockTable,
  store::SocialStore,
  user::User,
};

pub struct LikeService<S> {
  store: Arc<S>,
  locks: LockTable<LikeTarget>,
}

impl<S: SocialStore> LikeService<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store, locks: LockTable::new() } }

  /// Resolve the acting user. `None` and unknown usernames are rejected.
  pub async fn acting_user(&self, username: Option<&str>) -> Result<User> {
    let Some(username) = username else {
      return Err(Error::InvalidUser(None));
    };
    self
      .store
      .find_user_by_username(username)
      .await
      .map_err(Error::persistence)?
      .ok_or_else(|| Error::InvalidUser(Some(username.to_owned())))
  }

  /// Classify a bare id. Activities take precedence over statuses that
  /// happen to share the id.
  pub async fn resolve_target(&self, id: i64) -> Result<LikeTarget> {
    if self
      .store
      .find_activity_by_id(id)
      .await
      .map_err(Error::persistence)?
      .is_some()
    {
      return Ok(LikeTarget::Activity(id));
    }
    if self
      .store
      .find_status_by_id(id)
      .await
      .map_err(Error::persistence)?
      .is_some()
    {
      return Ok(LikeTarget::Status(id));
    }
    Err(Error::TargetNotFound(id))
  }

  /// Toggle the like of `acting_username` on whatever `target_id` resolves
  /// to. This is the entry point for the inbound "like" action.
  pub async fn toggle_like(
    &self,
    acting_username: Option<&str>,
    target_id: i64,
  ) -> Result<Toggle> {
    let user   = self.acting_user(acting_username).await?;
    let target = self.resolve_target(target_id).await?;
    self.toggle_resolved(&user, target).await
  }

  /// Toggle the like of `user` on a typed target, which must exist.
  pub async fn toggle(&self, user: &User, target: LikeTarget) -> Result<Toggle> {
    let exists = match target {
      LikeTarget::Activity(id) => self
        .store
        .find_activity_by_id(id)
        .await
        .map_err(Error::persistence)?
        .is_some(),
      LikeTarget::Status(id) => self
        .store
        .find_status_by_id(id)
        .await
        .map_err(Error::persistence)?
        .is_some(),
    };
    if !exists {
      return Err(Error::TargetNotFound(target.id()));
    }
    self.toggle_resolved(user, target).await
  }

  async fn toggle_resolved(&self, user: &User, target: LikeTarget) -> Result<Toggle> {
    let _held = self.locks.lock(target).await;

    let existing = self
      .store
      .find_like_aggregate(target)
      .await
      .map_err(Error::persistence)?;

    let liked = match existing {
      None => {
        let agg = self
          .store
          .create_like_aggregate(target, user.user_id)
          .await
          .map_err(Error::persistence)?;
        debug!(%target, like_id = agg.like_id, "created like aggregate");
        true
      }
      Some(agg) if agg.is_liked_by(user.user_id) => {
        self
          .store
          .remove_member(agg.like_id, user.user_id)
          .await
          .map_err(Error::persistence)?;
        false
      }
      Some(agg) => {
        self
          .store
          .add_member(agg.like_id, user.user_id)
          .await
          .map_err(Error::persistence)?;
        true
      }
    };

    info!(%target, user = %user.username, liked, "toggled like");
    Ok(Toggle { liked })
  }
}

#[cfg(test)]
mod tests {
  use std::{collections::BTreeSet, sync::Mutex};

  use chrono::Utc;

  use super::*;
  use crate::{
    book::{Book, Category, Favourite, NewShelfEntry, ShelvedBook},
    like::LikeAggregate,
    post::{
      Activity, ActivityEntry, NewActivity, NewReview, Review, ReviewEntry, Status,
      StatusEntry,
    },
  };

  #[derive(Debug, thiserror::Error)]
  #[error("memory store: {0}")]
  struct MemError(&'static str);

  #[derive(Default)]
  struct State {
    users:      Vec<User>,
    activities: Vec<Activity>,
    statuses:   Vec<Status>,
    likes:      Vec<LikeAggregate>,
    writes:     usize,
    fail_reads: bool,
  }

  /// In-memory store that yields at every call so concurrent toggles
  /// interleave between their read and their write.
  #[derive(Default)]
  struct MemoryStore {
    state: Mutex<State>,
  }

  impl MemoryStore {
    fn with<T>(&self, f: impl FnOnce(&mut State) -> T) -> T { f(&mut self.state.lock().unwrap()) }

    fn user(&self, id: i64, name: &str) -> User {
      let user = User { user_id: id, username: name.into() };
      self.with(|s| s.users.push(user.clone()));
      user
    }

    fn activity(&self, id: i64) {
      self.with(|s| {
        s.activities.push(Activity {
          activity_id:   id,
          user_id:       1,
          category:      None,
          activity_text: "finished Dune".into(),
          created_at:    Utc::now(),
        })
      });
    }

    fn status(&self, id: i64) {
      self.with(|s| {
        s.statuses.push(Status {
          status_id:   id,
          user_id:     1,
          status_text: "reading".into(),
          created_at:  Utc::now(),
        })
      });
    }

    fn members(&self, target: LikeTarget) -> Option<BTreeSet<i64>> {
      self.with(|s| {
        s.likes
          .iter()
          .find(|l| l.target == target)
          .map(|l| l.liked_by.clone())
      })
    }

    fn writes(&self) -> usize { self.with(|s| s.writes) }

    fn aggregate_count(&self) -> usize { self.with(|s| s.likes.len()) }
  }

  impl SocialStore for MemoryStore {
    type Error = MemError;

    async fn create_user(&self, _: &str) -> Result<User, MemError> { unimplemented!() }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, MemError> {
      tokio::task::yield_now().await;
      Ok(self.with(|s| s.users.iter().find(|u| u.username == username).cloned()))
    }

    async fn record_activity(&self, _: NewActivity) -> Result<Activity, MemError> { unimplemented!() }

    async fn find_activity_by_id(&self, id: i64) -> Result<Option<Activity>, MemError> {
      tokio::task::yield_now().await;
      self.with(|s| {
        if s.fail_reads {
          return Err(MemError("read failed"));
        }
        Ok(s.activities.iter().find(|a| a.activity_id == id).cloned())
      })
    }

    async fn list_activities(&self, _: usize) -> Result<Vec<ActivityEntry>, MemError> { unimplemented!() }

    async fn post_status(&self, _: i64, _: String) -> Result<Status, MemError> { unimplemented!() }

    async fn find_status_by_id(&self, id: i64) -> Result<Option<Status>, MemError> {
      tokio::task::yield_now().await;
      Ok(self.with(|s| s.statuses.iter().find(|st| st.status_id == id).cloned()))
    }

    async fn list_statuses(&self) -> Result<Vec<StatusEntry>, MemError> { unimplemented!() }

    async fn find_like_aggregate(&self, target: LikeTarget) -> Result<Option<LikeAggregate>, MemError> {
      tokio::task::yield_now().await;
      Ok(self.with(|s| s.likes.iter().find(|l| l.target == target).cloned()))
    }

    async fn create_like_aggregate(
      &self,
      target: LikeTarget,
      initial_member: i64,
    ) -> Result<LikeAggregate, MemError> {
      tokio::task::yield_now().await;
      Ok(self.with(|s| {
        s.writes += 1;
        let agg = LikeAggregate {
          like_id:  s.likes.len() as i64 + 1,
          target,
          liked_by: BTreeSet::from([initial_member]),
        };
        s.likes.push(agg.clone());
        agg
      }))
    }

    async fn add_member(&self, like_id: i64, user_id: i64) -> Result<(), MemError> {
      tokio::task::yield_now().await;
      self.with(|s| {
        s.writes += 1;
        let agg = s.likes.iter_mut().find(|l| l.like_id == like_id).ok_or(MemError("no aggregate"))?;
        agg.liked_by.insert(user_id);
        Ok(())
      })
    }

    async fn remove_member(&self, like_id: i64, user_id: i64) -> Result<(), MemError> {
      tokio::task::yield_now().await;
      self.with(|s| {
        s.writes += 1;
        let agg = s.likes.iter_mut().find(|l| l.like_id == like_id).ok_or(MemError("no aggregate"))?;
        agg.liked_by.remove(&user_id);
        Ok(())
      })
    }

    async fn record_review(&self, _: NewReview) -> Result<Review, MemError> { unimplemented!() }

    async fn list_reviews(&self) -> Result<Vec<ReviewEntry>, MemError> { unimplemented!() }

    async fn create_category(&self, _: &str) -> Result<Category, MemError> { unimplemented!() }

    async fn shelve_book(&self, _: NewShelfEntry) -> Result<ShelvedBook, MemError> { unimplemented!() }

    async fn list_user_books(&self, _: i64) -> Result<Vec<ShelvedBook>, MemError> { unimplemented!() }

    async fn add_favourite(&self, _: i64, _: Book) -> Result<(), MemError> { unimplemented!() }

    async fn list_favourites(&self, _: i64) -> Result<Vec<Favourite>, MemError> { unimplemented!() }
  }

  fn service() -> (LikeService<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::default());
    (LikeService::new(store.clone()), store)
  }

  // ─── Toggle semantics ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn alice_and_bob_like_an_activity() {
    let (svc, store) = service();
    store.user(1, "alice");
    store.user(2, "bob");
    store.activity(42);
    let target = LikeTarget::Activity(42);

    assert!(svc.toggle_like(Some("alice"), 42).await.unwrap().liked);
    assert_eq!(store.members(target), Some(BTreeSet::from([1])));

    assert!(svc.toggle_like(Some("bob"), 42).await.unwrap().liked);
    assert_eq!(store.members(target), Some(BTreeSet::from([1, 2])));

    assert!(!svc.toggle_like(Some("alice"), 42).await.unwrap().liked);
    assert_eq!(store.members(target), Some(BTreeSet::from([2])));
    assert_eq!(store.aggregate_count(), 1);
  }

  #[tokio::test]
  async fn double_toggle_restores_membership() {
    let (svc, store) = service();
    let alice = store.user(1, "alice");
    store.user(2, "bob");
    store.status(9);
    let target = LikeTarget::Status(9);

    svc.toggle_like(Some("bob"), 9).await.unwrap();
    let before = store.members(target);

    assert_eq!(svc.toggle(&alice, target).await.unwrap(), Toggle { liked: true });
    assert_eq!(svc.toggle(&alice, target).await.unwrap(), Toggle { liked: false });
    assert_eq!(store.members(target), before);
  }

  #[tokio::test]
  async fn emptied_aggregate_is_reused() {
    let (svc, store) = service();
    store.user(1, "alice");
    store.activity(5);

    svc.toggle_like(Some("alice"), 5).await.unwrap();
    svc.toggle_like(Some("alice"), 5).await.unwrap();
    assert_eq!(store.members(LikeTarget::Activity(5)), Some(BTreeSet::new()));

    assert!(svc.toggle_like(Some("alice"), 5).await.unwrap().liked);
    assert_eq!(store.aggregate_count(), 1);
  }

  #[tokio::test]
  async fn each_toggle_writes_once() {
    let (svc, store) = service();
    store.user(1, "alice");
    store.user(2, "bob");
    store.activity(3);

    svc.toggle_like(Some("alice"), 3).await.unwrap();
    svc.toggle_like(Some("bob"), 3).await.unwrap();
    svc.toggle_like(Some("alice"), 3).await.unwrap();
    assert_eq!(store.writes(), 3);
  }

  // ─── Target resolution ─────────────────────────────────────────────────────

  #[tokio::test]
  async fn activity_wins_over_status_with_same_id() {
    let (svc, store) = service();
    store.activity(7);
    store.status(7);
    assert_eq!(svc.resolve_target(7).await.unwrap(), LikeTarget::Activity(7));
  }

  #[tokio::test]
  async fn status_is_used_when_no_activity_matches() {
    let (svc, store) = service();
    store.status(8);
    assert_eq!(svc.resolve_target(8).await.unwrap(), LikeTarget::Status(8));
  }

  #[tokio::test]
  async fn aggregates_are_scoped_to_target_kind() {
    let (svc, store) = service();
    let alice = store.user(1, "alice");
    store.activity(7);
    store.status(7);

    svc.toggle(&alice, LikeTarget::Activity(7)).await.unwrap();
    assert!(store.members(LikeTarget::Status(7)).is_none());

    assert!(svc.toggle(&alice, LikeTarget::Status(7)).await.unwrap().liked);
    assert_eq!(store.aggregate_count(), 2);
  }

  // ─── Failure paths ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn missing_or_unknown_user_is_rejected_without_writes() {
    let (svc, store) = service();
    store.activity(1);

    assert!(matches!(svc.toggle_like(None, 1).await, Err(Error::InvalidUser(None))));
    assert!(matches!(
      svc.toggle_like(Some("mallory"), 1).await,
      Err(Error::InvalidUser(Some(name))) if name == "mallory"
    ));
    assert_eq!(store.writes(), 0);
  }

  #[tokio::test]
  async fn unknown_target_is_rejected_without_writes() {
    let (svc, store) = service();
    let alice = store.user(1, "alice");

    assert!(matches!(svc.toggle_like(Some("alice"), 99).await, Err(Error::TargetNotFound(99))));
    assert!(matches!(
      svc.toggle(&alice, LikeTarget::Status(99)).await,
      Err(Error::TargetNotFound(99))
    ));
    assert_eq!(store.writes(), 0);
  }

  #[tokio::test]
  async fn store_failure_is_surfaced_as_persistence_error() {
    let (svc, store) = service();
    store.user(1, "alice");
    store.with(|s| s.fail_reads = true);

    assert!(matches!(svc.toggle_like(Some("alice"), 1).await, Err(Error::Persistence(_))));
    assert_eq!(store.writes(), 0);
  }

  // ─── Concurrency ───────────────────────────────────────────────────────────

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_first_likes_share_one_aggregate() {
    let (svc, store) = service();
    for id in 1..=10 {
      store.user(id, &format!("user{id}"));
    }
    store.activity(42);
    let svc = Arc::new(svc);

    let mut tasks = tokio::task::JoinSet::new();
    for id in 1..=10 {
      let svc = svc.clone();
      tasks.spawn(async move { svc.toggle_like(Some(&format!("user{id}")), 42).await });
    }
    while let Some(res) = tasks.join_next().await {
      assert!(res.unwrap().unwrap().liked);
    }

    assert_eq!(store.aggregate_count(), 1);
    assert_eq!(store.members(LikeTarget::Activity(42)), Some((1..=10).collect::<BTreeSet<i64>>()));
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_toggles_by_one_user_alternate() {
    let (svc, store) = service();
    store.user(1, "alice");
    store.status(3);
    let svc = Arc::new(svc);

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..20 {
      let svc = svc.clone();
      tasks.spawn(async move { svc.toggle_like(Some("alice"), 3).await.unwrap().liked });
    }
    let mut liked = 0;
    while let Some(res) = tasks.join_next().await {
      if res.unwrap() {
        liked += 1;
      }
    }

    assert_eq!(liked, 10);
    assert_eq!(store.members(LikeTarget::Status(3)), Some(BTreeSet::new()));
  }
}
