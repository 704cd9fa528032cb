//! `GET /feed`: the home page load.
//!
//! Returns the newest activities, every status, the session user (if the
//! request has one) with their shelf, and the trending-books payload from the
//! shared cache.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::Value;
use shelf_core::{
  Error,
  book::ShelvedBook,
  catalog::CatalogSource,
  post::{ActivityEntry, StatusEntry},
  store::SocialStore,
  user::User,
};

use crate::{AppState, error::ApiError, session::SessionUser};

#[derive(Debug, Serialize)]
pub struct Feed {
  pub user:           Option<User>,
  /// The session user's shelf; empty without a known session user.
  pub existing_books: Vec<ShelvedBook>,
  pub activities:     Vec<ActivityEntry>,
  pub statuses:       Vec<StatusEntry>,
  pub trending:       Value,
}

pub async fn handler<S, C>(
  State(state): State<AppState<S, C>>,
  SessionUser(username): SessionUser,
) -> Result<Json<Feed>, ApiError>
where
  S: SocialStore,
  C: CatalogSource,
{
  let user = match username.as_deref() {
    Some(name) => state
      .store
      .find_user_by_username(name)
      .await
      .map_err(Error::persistence)?,
    None => None,
  };

  let existing_books = match &user {
    Some(user) => state
      .store
      .list_user_books(user.user_id)
      .await
      .map_err(Error::persistence)?,
    None => Vec::new(),
  };

  let activities = state
    .store
    .list_activities(state.feed_limit)
    .await
    .map_err(Error::persistence)?;

  let statuses = state
    .store
    .list_statuses()
    .await
    .map_err(Error::persistence)?;

  let trending = state.trending.get_or_refresh().await?;

  Ok(Json(Feed { user, existing_books, activities, statuses, trending }))
}
