//! Error type for `shelf-catalog`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("failed to build HTTP client: {0}")]
  Build(#[source] reqwest::Error),

  #[error("GET {url} failed: {source}")]
  Request {
    url:    String,
    source: reqwest::Error,
  },

  #[error("GET {url} → {status}")]
  Status { url: String, status: u16 },

  /// The body was not the JSON document the catalog promises.
  #[error("GET {url}: malformed body: {source}")]
  Decode {
    url:    String,
    source: reqwest::Error,
  },

  #[error("invalid work id: {0:?}")]
  InvalidWorkId(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
