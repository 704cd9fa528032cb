//! `POST /statuses`: post a status update as the session user.
//!
//! Form body: `text=<status text>`.

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use shelf_core::{
  Error,
  catalog::CatalogSource,
  post::Status,
  store::SocialStore,
};
use tracing::info;

use crate::{AppState, error::ApiError, form::ApiForm, session::RequireSession};

#[derive(Debug, Deserialize)]
pub struct StatusForm {
  pub text: String,
}

#[derive(Debug, Serialize)]
pub struct Posted {
  pub success: bool,
  pub status:  Status,
}

pub async fn create<S, C>(
  State(state): State<AppState<S, C>>,
  RequireSession(username): RequireSession,
  ApiForm(form): ApiForm<StatusForm>,
) -> Result<(StatusCode, Json<Posted>), ApiError>
where
  S: SocialStore,
  C: CatalogSource,
{
  let text = form.text.trim();
  if text.is_empty() {
    return Err(ApiError::BadRequest("status text must not be empty".into()));
  }

  let user = state
    .store
    .find_user_by_username(&username)
    .await
    .map_err(Error::persistence)?
    .ok_or_else(|| Error::InvalidUser(Some(username.clone())))?;

  let status = state
    .store
    .post_status(user.user_id, text.to_owned())
    .await
    .map_err(Error::persistence)?;

  info!(user = %user.username, status_id = status.status_id, "posted status");
  Ok((StatusCode::CREATED, Json(Posted { success: true, status })))
}
