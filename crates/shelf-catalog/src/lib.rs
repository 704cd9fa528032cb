//! Async HTTP client for the Open Library catalog.
//!
//! Implements [`shelf_core::catalog::CatalogSource`] so the trending-books
//! cache and the reviews page can read from the public catalog.

pub mod error;

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use shelf_core::catalog::CatalogSource;
use tracing::debug;

pub use error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";

/// Async client for the Open Library JSON API. No authentication.
///
/// Cheap to clone — the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct OpenLibraryClient {
  client:   Client,
  base_url: String,
}

impl OpenLibraryClient {
  pub fn new(base_url: impl Into<String>) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .map_err(Error::Build)?;
    Ok(Self { client, base_url: base_url.into() })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url.trim_end_matches('/'), path)
  }

  async fn get_json(&self, url: String, query: &[(&str, String)]) -> Result<Value> {
    debug!(%url, "catalog request");
    let resp = self
      .client
      .get(&url)
      .query(query)
      .send()
      .await
      .map_err(|source| Error::Request { url: url.clone(), source })?;

    let status = resp.status();
    if !status.is_success() {
      return Err(Error::Status { url, status: status.as_u16() });
    }
    resp
      .json()
      .await
      .map_err(|source| Error::Decode { url, source })
  }
}

impl CatalogSource for OpenLibraryClient {
  type Error = Error;

  /// `GET /trending/weekly.json?limit=<limit>`
  async fn fetch_trending_books(&self, limit: usize) -> Result<Value> {
    self
      .get_json(self.url("/trending/weekly.json"), &[("limit", limit.to_string())])
      .await
  }

  /// `GET /works/<id>.json`. Accepts a bare key (`OL45804W`) or a work path
  /// (`/works/OL45804W`); anything else is rejected before a request is made.
  async fn fetch_work(&self, work_id: &str) -> Result<Value> {
    let id = work_id.strip_prefix("/works/").unwrap_or(work_id);
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_alphanumeric()) {
      return Err(Error::InvalidWorkId(work_id.to_owned()));
    }
    self.get_json(self.url(&format!("/works/{id}.json")), &[]).await
  }
}
