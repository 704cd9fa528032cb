//! Request-scoped session identity.
//!
//! Authentication happens upstream; the authenticating proxy forwards the
//! username in a trusted header (`x-shelf-user` unless configured
//! otherwise). The username is extracted per request and passed explicitly
//! to the services, so nothing about one request outlives it.

use std::convert::Infallible;

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{AppState, error::ApiError};

/// The session username, if the request carried one.
pub struct SessionUser(pub Option<String>);

/// A session username that must be present; rejects with `401` otherwise.
pub struct RequireSession(pub String);

fn session_username<S, C>(parts: &Parts, state: &AppState<S, C>) -> Option<String> {
  parts
    .headers
    .get(&*state.session_header)
    .and_then(|v| v.to_str().ok())
    .map(str::trim)
    .filter(|name| !name.is_empty())
    .map(str::to_owned)
}

impl<S, C> FromRequestParts<AppState<S, C>> for SessionUser
where
  S: Send + Sync,
  C: Send + Sync,
{
  type Rejection = Infallible;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    Ok(SessionUser(session_username(parts, state)))
  }
}

impl<S, C> FromRequestParts<AppState<S, C>> for RequireSession
where
  S: Send + Sync,
  C: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, C>,
  ) -> Result<Self, Self::Rejection> {
    session_username(parts, state)
      .map(RequireSession)
      .ok_or(ApiError::Unauthorized)
  }
}
