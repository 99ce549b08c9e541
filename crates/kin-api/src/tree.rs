//! `GET /family-tree`: the whole family as a forest.
//!
//! Query parameters (all optional):
//!
//! - `rootPersonId`: anchor the single tree at this person; 404 if unknown.
//! - `order`: `insertion` (default) or `birth_date`.
//! - `maxDepth`: lower the configured depth limit; larger values are
//!   clamped to it.

use axum::{
  Json,
  extract::{Query, State},
};
use kin_core::{ChildOrder, TreeNode, family_tree, person::PersonId, store::FamilyStore};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeParams {
  pub root_person_id: Option<String>,
  pub order:          Option<ChildOrder>,
  pub max_depth:      Option<usize>,
}

pub async fn handler<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<TreeParams>,
) -> Result<Json<Vec<TreeNode>>, ApiError>
where
  S: FamilyStore + 'static,
{
  let mut options = state.tree_options;
  if let Some(order) = params.order {
    options.child_order = order;
  }
  // A client may only lower the configured depth limit.
  if let Some(depth) = params.max_depth {
    options.max_depth = depth.min(state.tree_options.max_depth);
  }

  // `?rootPersonId=` with no value means no anchor.
  let anchor = params
    .root_person_id
    .filter(|s| !s.trim().is_empty())
    .map(PersonId::new);

  let forest = family_tree(state.store.as_ref(), anchor.as_ref(), options).await?;
  tracing::debug!(roots = forest.len(), anchored = anchor.is_some(), "built family tree");
  Ok(Json(forest))
}
