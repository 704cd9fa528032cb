//! Error type for `shelf-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A like row with both or neither of its target columns set.
  #[error("like {0} has no single target")]
  AmbiguousTarget(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
