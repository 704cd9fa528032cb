//! Shelf server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `SHELF_*` environment variables, opens the SQLite store, and serves the
//! feed API over HTTP.
//!
//! # Creating users
//!
//! Accounts are provisioned out of band; to add one and exit:
//!
//! ```
//! cargo run -p shelf-api --bin server -- --create-user alice
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use shelf_api::{AppState, ServerConfig};
use shelf_catalog::OpenLibraryClient;
use shelf_core::store::SocialStore;
use shelf_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Shelf feed server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Create a user with this username and exit.
  #[arg(long, value_name = "USERNAME")]
  create_user: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("SHELF"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: provision a user and exit.
  if let Some(username) = cli.create_user {
    let user = store
      .create_user(&username)
      .await
      .with_context(|| format!("failed to create user {username:?}"))?;
    println!("created user {} (id {})", user.username, user.user_id);
    return Ok(());
  }

  let catalog = OpenLibraryClient::new(server_cfg.catalog_url.clone())
    .context("failed to build catalog client")?;

  tracing::info!(
    ttl_ms = server_cfg.trending_ttl_ms,
    limit = server_cfg.trending_limit,
    "trending cache configured"
  );
  let state = AppState::new(Arc::new(store), Arc::new(catalog), &server_cfg);

  let app = shelf_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
