//! Handlers for `/relationships` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/relationships` | Every stored edge |
//! | `POST`   | `/relationships` | Body: [`CreateRelationshipBody`]; returns 201 + written rows |
//! | `DELETE` | `/relationships/{id}` | Removes the edge and its inverse |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kin_core::{
  person::PersonId,
  relationship::{NewRelationship, Relationship, RelationshipKind},
  store::FamilyStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /relationships`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: FamilyStore + 'static,
{
  let rels = state
    .store
    .list_relationships()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rels))
}

// ─── Create ──────────────────────────────────────────────────────────────────

fn default_mirror() -> bool { true }

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRelationshipBody {
  pub from_id: PersonId,
  pub to_id:   PersonId,
  /// `parent`, `child` or `spouse` (`partner` is accepted as spouse).
  pub kind:    String,
  /// Also write the inverse edge. Default `true`.
  #[serde(default = "default_mirror")]
  pub mirror:  bool,
}

/// `POST /relationships`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateRelationshipBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FamilyStore + 'static,
{
  let kind: RelationshipKind = body
    .kind
    .parse()
    .map_err(|e: kin_core::Error| ApiError::BadRequest(e.to_string()))?;
  let edge = NewRelationship::new(body.from_id, body.to_id, kind)
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

  for id in [&edge.from_id, &edge.to_id] {
    let exists = state
      .store
      .get_person(id.clone())
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .is_some();
    if !exists {
      return Err(ApiError::BadRequest(format!("person {id} does not exist")));
    }
  }

  let rows = if body.mirror {
    state
      .store
      .relate(edge.from_id, edge.to_id, edge.kind)
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
  } else {
    let existing = state
      .store
      .relationships_for(edge.from_id.clone())
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?;
    if existing
      .iter()
      .any(|r| r.from_id == edge.from_id && r.to_id == edge.to_id && r.kind == edge.kind)
    {
      return Err(ApiError::Conflict(format!(
        "{} -{}-> {} already exists",
        edge.from_id, edge.kind, edge.to_id
      )));
    }
    vec![
      state
        .store
        .add_relationship(edge)
        .await
        .map_err(|e| ApiError::Store(Box::new(e)))?,
    ]
  };

  Ok((StatusCode::CREATED, Json(rows)))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /relationships/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: FamilyStore + 'static,
{
  let deleted = state
    .store
    .delete_relationship(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("relationship {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}
