//! JSON/form HTTP surface for Shelf.
//!
//! Exposes an axum [`Router`] backed by any [`SocialStore`] and
//! [`CatalogSource`]. Authentication happens upstream; see [`session`].
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/feed` | Activities, statuses, session user and shelf, trending books |
//! | `POST` | `/statuses` | Form `text=...`; session required |
//! | `POST` | `/likes` | Form `id=...`; session required; returns `{"liked":bool}` |
//! | `GET`  | `/reviews` | Reviews with their catalog work documents |
//! | `GET`  | `/profile` | Session user's shelf and favourites; session required |

pub mod error;
pub mod feed;
pub mod form;
pub mod likes;
pub mod profile;
pub mod reviews;
pub mod session;
pub mod statuses;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use shelf_core::{
  cache::{DEFAULT_TRENDING_LIMIT, DEFAULT_TTL_MS, FetchCache, TrendingBooks},
  catalog::CatalogSource,
  likes::LikeService,
  store::SocialStore,
};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `SHELF_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:            String,
  #[serde(default = "default_port")]
  pub port:            u16,
  #[serde(default = "default_store_path")]
  pub store_path:      PathBuf,
  #[serde(default = "default_catalog_url")]
  pub catalog_url:     String,
  #[serde(default = "default_trending_limit")]
  pub trending_limit:  usize,
  #[serde(default = "default_trending_ttl_ms")]
  pub trending_ttl_ms: i64,
  /// Number of activities shown on the feed.
  #[serde(default = "default_feed_limit")]
  pub feed_limit:      usize,
  /// Trusted header carrying the authenticated username.
  #[serde(default = "default_session_header")]
  pub session_header:  String,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 5173 }
fn default_store_path() -> PathBuf { PathBuf::from("shelf.db") }
fn default_catalog_url() -> String { shelf_catalog::DEFAULT_BASE_URL.into() }
fn default_trending_limit() -> usize { DEFAULT_TRENDING_LIMIT }
fn default_trending_ttl_ms() -> i64 { DEFAULT_TTL_MS }
fn default_feed_limit() -> usize { 20 }
fn default_session_header() -> String { "x-shelf-user".into() }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:            default_host(),
      port:            default_port(),
      store_path:      default_store_path(),
      catalog_url:     default_catalog_url(),
      trending_limit:  default_trending_limit(),
      trending_ttl_ms: default_trending_ttl_ms(),
      feed_limit:      default_feed_limit(),
      session_header:  default_session_header(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers. The trending cache and
/// the like service's lock table live here, one instance per server.
pub struct AppState<S, C> {
  pub store:          Arc<S>,
  pub catalog:        Arc<C>,
  pub likes:          Arc<LikeService<S>>,
  pub trending:       Arc<FetchCache<TrendingBooks<C>>>,
  pub feed_limit:     usize,
  pub session_header: Arc<str>,
}

impl<S, C> Clone for AppState<S, C> {
  fn clone(&self) -> Self {
    Self {
      store:          self.store.clone(),
      catalog:        self.catalog.clone(),
      likes:          self.likes.clone(),
      trending:       self.trending.clone(),
      feed_limit:     self.feed_limit,
      session_header: self.session_header.clone(),
    }
  }
}

impl<S: SocialStore, C: CatalogSource> AppState<S, C> {
  pub fn new(store: Arc<S>, catalog: Arc<C>, config: &ServerConfig) -> Self {
    let trending = FetchCache::new(
      TrendingBooks::new(catalog.clone(), config.trending_limit),
      config.trending_ttl_ms,
    );
    Self {
      likes: Arc::new(LikeService::new(store.clone())),
      store,
      catalog,
      trending: Arc::new(trending),
      feed_limit: config.feed_limit,
      session_header: config.session_header.to_ascii_lowercase().into(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the application router for `state`.
pub fn router<S, C>(state: AppState<S, C>) -> Router
where
  S: SocialStore + 'static,
  C: CatalogSource + 'static,
{
  Router::new()
    .route("/feed", get(feed::handler::<S, C>))
    .route("/statuses", post(statuses::create::<S, C>))
    .route("/likes", post(likes::toggle::<S, C>))
    .route("/reviews", get(reviews::list::<S, C>))
    .route("/profile", get(profile::handler::<S, C>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
