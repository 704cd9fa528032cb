//! `GET /profile`: the session user's shelf and favourites.

use axum::{Json, extract::State};
use serde::Serialize;
use shelf_core::{
  Error,
  book::{Favourite, ShelvedBook},
  catalog::CatalogSource,
  store::SocialStore,
  user::User,
};

use crate::{AppState, error::ApiError, session::RequireSession};

#[derive(Debug, Serialize)]
pub struct Profile {
  pub user:       User,
  pub books:      Vec<ShelvedBook>,
  pub favourites: Vec<Favourite>,
}

pub async fn handler<S, C>(
  State(state): State<AppState<S, C>>,
  RequireSession(username): RequireSession,
) -> Result<Json<Profile>, ApiError>
where
  S: SocialStore,
  C: CatalogSource,
{
  let user = state
    .store
    .find_user_by_username(&username)
    .await
    .map_err(Error::persistence)?
    .ok_or_else(|| Error::InvalidUser(Some(username.clone())))?;

  let books = state
    .store
    .list_user_books(user.user_id)
    .await
    .map_err(Error::persistence)?;

  let favourites = state
    .store
    .list_favourites(user.user_id)
    .await
    .map_err(Error::persistence)?;

  Ok(Json(Profile { user, books, favourites }))
}
