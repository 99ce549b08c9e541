//! kin-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus any
//! `KIN_*` environment overrides, opens the SQLite store and serves the
//! family API over HTTP.
//!
//! To load the demo family into an empty database:
//!
//! ```
//! cargo run -p kin-server -- --seed
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::Parser;
use kin_server::{ServerConfig, expand_tilde, seed::seed_demo_family};
use kin_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Kin family tree server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Insert the demo family before serving. Existing rows are kept.
  #[arg(long)]
  seed: bool,
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
    .add_source(config::Environment::with_prefix("KIN"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent() {
    tokio::fs::create_dir_all(parent)
      .await
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let upload_dir = expand_tilde(&server_cfg.upload_dir);
  tokio::fs::create_dir_all(&upload_dir)
    .await
    .with_context(|| format!("failed to create upload directory {upload_dir:?}"))?;

  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if cli.seed {
    seed_demo_family(&store)
      .await
      .context("failed to seed demo family")?;
  }

  let app = kin_server::app(Arc::new(store), server_cfg.tree_options(), upload_dir);
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
