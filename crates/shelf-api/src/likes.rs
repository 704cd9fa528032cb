//! `POST /likes`: toggle the session user's like on an activity or status.
//!
//! Form body: `id=<activity or status id>`. Responds with `{"liked": bool}`.

use axum::{Json, extract::State};
use serde::Deserialize;
use shelf_core::{catalog::CatalogSource, like::Toggle, store::SocialStore};

use crate::{AppState, error::ApiError, form::ApiForm, session::RequireSession};

#[derive(Debug, Deserialize)]
pub struct LikeForm {
  pub id: i64,
}

pub async fn toggle<S, C>(
  State(state): State<AppState<S, C>>,
  RequireSession(username): RequireSession,
  ApiForm(form): ApiForm<LikeForm>,
) -> Result<Json<Toggle>, ApiError>
where
  S: SocialStore,
  C: CatalogSource,
{
  let toggle = state.likes.toggle_like(Some(&username), form.id).await?;
  Ok(Json(toggle))
}
