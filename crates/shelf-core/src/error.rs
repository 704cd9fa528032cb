//! Error types for `shelf-core`.

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// The acting user was absent or did not resolve to a stored user.
  #[error("acting user is missing or unknown: {0:?}")]
  InvalidUser(Option<String>),

  /// Neither an activity nor a status carries this id.
  #[error("no activity or status with id {0}")]
  TargetNotFound(i64),

  #[error("upstream fetch failed: {0}")]
  UpstreamFetch(#[source] BoxError),

  #[error("persistence error: {0}")]
  Persistence(#[source] BoxError),
}

impl Error {
  pub fn persistence<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(e))
  }

  pub fn upstream<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::UpstreamFetch(Box::new(e))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
