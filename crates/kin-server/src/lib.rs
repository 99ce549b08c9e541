//! HTTP server composition for Kin.
//!
//! Mounts the family API and the media router under `/api/v1`, serves the
//! upload directory under `/uploads` and wraps everything in request tracing.

pub mod seed;

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use axum::Router;
use kin_core::{ChildOrder, TreeOptions, media::MediaStore, store::FamilyStore};
use kin_media::MediaConfig;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `KIN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  /// SQLite database file. A leading `~` is expanded.
  #[serde(default = "default_store_path")]
  pub store_path:       PathBuf,
  /// Root of the uploaded files. A leading `~` is expanded.
  #[serde(default = "default_upload_dir")]
  pub upload_dir:       PathBuf,
  #[serde(default = "default_tree_max_depth")]
  pub tree_max_depth:   usize,
  #[serde(default = "default_tree_max_nodes")]
  pub tree_max_nodes:   usize,
  #[serde(default)]
  pub tree_child_order: ChildOrder,
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 3001 }
fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/kin/kin.db") }
fn default_upload_dir() -> PathBuf { PathBuf::from("~/.local/share/kin/uploads") }
fn default_tree_max_depth() -> usize { kin_core::tree::DEFAULT_MAX_DEPTH }
fn default_tree_max_nodes() -> usize { kin_core::tree::DEFAULT_MAX_NODES }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      store_path:       default_store_path(),
      upload_dir:       default_upload_dir(),
      tree_max_depth:   default_tree_max_depth(),
      tree_max_nodes:   default_tree_max_nodes(),
      tree_child_order: ChildOrder::default(),
    }
  }
}

impl ServerConfig {
  pub fn tree_options(&self) -> TreeOptions {
    TreeOptions {
      max_depth:   self.tree_max_depth,
      max_nodes:   self.tree_max_nodes,
      child_order: self.tree_child_order,
    }
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// The whole application. `upload_dir` must already be expanded.
pub fn app<S>(store: Arc<S>, tree_options: TreeOptions, upload_dir: PathBuf) -> Router
where
  S: FamilyStore + MediaStore + 'static,
{
  let api = kin_api::api_router(Arc::clone(&store), tree_options).merge(
    kin_media::media_router(store, MediaConfig { upload_dir: upload_dir.clone() }),
  );

  Router::new()
    .nest("/api/v1", api)
    .nest_service("/uploads", ServeDir::new(upload_dir))
    .layer(TraceLayer::new_for_http())
}
