//! `GET /reviews`: every review with its author and catalog work document.
//!
//! Work documents are fetched from the catalog concurrently. A review whose
//! work cannot be fetched is still listed, with `work: null`.

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::Value;
use shelf_core::{
  Error,
  catalog::CatalogSource,
  post::ReviewEntry,
  store::SocialStore,
};
use tokio::task::JoinSet;
use tracing::warn;

use crate::{AppState, error::ApiError};

#[derive(Debug, Serialize)]
pub struct ReviewWithWork {
  #[serde(flatten)]
  pub entry: ReviewEntry,
  pub work:  Option<Value>,
}

pub async fn list<S, C>(
  State(state): State<AppState<S, C>>,
) -> Result<Json<Vec<ReviewWithWork>>, ApiError>
where
  S: SocialStore,
  C: CatalogSource + 'static,
{
  let entries = state
    .store
    .list_reviews()
    .await
    .map_err(Error::persistence)?;

  let mut works: Vec<Option<Value>> = vec![None; entries.len()];
  let mut tasks = JoinSet::new();
  for (idx, entry) in entries.iter().enumerate() {
    let catalog: Arc<C> = state.catalog.clone();
    let book_id = entry.review.book_id.clone();
    tasks.spawn(async move {
      let res = catalog.fetch_work(&book_id).await;
      (idx, book_id, res)
    });
  }

  while let Some(joined) = tasks.join_next().await {
    match joined {
      Ok((idx, _, Ok(work))) => works[idx] = Some(work),
      Ok((_, book_id, Err(e))) => warn!(%book_id, error = %e, "work fetch failed"),
      Err(e) => warn!(error = %e, "work fetch task failed"),
    }
  }

  let listed = entries
    .into_iter()
    .zip(works)
    .map(|(entry, work)| ReviewWithWork { entry, work })
    .collect();
  Ok(Json(listed))
}
