//! Form bodies whose rejections are reported like every other API error.

use axum::{
  Form,
  extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// [`Form`] with [`ApiError`] as its rejection: a missing, mistyped or
/// undecodable body becomes `400` with a JSON error body.
pub struct ApiForm<T>(pub T);

impl<T, S> FromRequest<S> for ApiForm<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Form(value) = Form::<T>::from_request(req, state).await?;
    Ok(ApiForm(value))
  }
}
