//! The `CatalogSource` trait: the remote book catalog collaborator.

use std::future::Future;

use serde_json::Value;

/// Read-only access to a public book catalog. Documents are passed through
/// as opaque JSON.
pub trait CatalogSource: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The current top `limit` trending books.
  fn fetch_trending_books(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + '_;

  /// A single work document, keyed by its catalog work id.
  fn fetch_work<'a>(
    &'a self,
    work_id: &'a str,
  ) -> impl Future<Output = Result<Value, Self::Error>> + Send + 'a;
}
