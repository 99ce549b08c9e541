//! JSON REST API for Kin.
//!
//! Exposes an axum [`Router`] backed by any [`kin_core::store::FamilyStore`].
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api/v1", kin_api::api_router(store.clone(), TreeOptions::default()))
//! ```

pub mod error;
pub mod health;
pub mod people;
pub mod relationships;
pub mod tree;

use std::sync::Arc;

use axum::{
  Router,
  routing::{delete, get},
};
use kin_core::{TreeOptions, store::FamilyStore};

pub use error::ApiError;

/// Shared handler state.
pub struct AppState<S> {
  pub store:        Arc<S>,
  /// Defaults for tree builds; `/family-tree` query parameters override them.
  pub tree_options: TreeOptions,
}

// Manual impl: `S` itself need not be `Clone`.
impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), tree_options: self.tree_options }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, tree_options: TreeOptions) -> Router<()>
where
  S: FamilyStore + 'static,
{
  Router::new()
    .route("/health", get(health::handler))
    // People
    .route("/people", get(people::list::<S>).post(people::create::<S>))
    .route(
      "/people/{id}",
      get(people::get_one::<S>)
        .put(people::update::<S>)
        .delete(people::delete_one::<S>),
    )
    .route("/people/{id}/relationships", get(people::relationships::<S>))
    .route("/people/{id}/tree", get(people::tree::<S>))
    // Relationships
    .route(
      "/relationships",
      get(relationships::list::<S>).post(relationships::create::<S>),
    )
    .route("/relationships/{id}", delete(relationships::delete_one::<S>))
    // Tree
    .route("/family-tree", get(tree::handler::<S>))
    .with_state(AppState { store, tree_options })
}
