//! Handlers for `/people` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people` | All people, insertion order |
//! | `POST`   | `/people` | Body: [`CreatePersonBody`]; returns 201 + person and new relationships |
//! | `GET`    | `/people/{id}` | 404 if not found |
//! | `PUT`    | `/people/{id}` | Body: [`NewPerson`]; full replace |
//! | `DELETE` | `/people/{id}` | 204, or 404 if not found |
//! | `GET`    | `/people/{id}/relationships` | Edges in either direction |
//! | `GET`    | `/people/{id}/tree` | Tree anchored at this person |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use kin_core::{
  TreeNode, family_tree,
  person::{NewPerson, Person, PersonId},
  relationship::{NewRelationship, Relationship, RelationshipKind},
  store::FamilyStore,
};
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

fn validate_names(input: &NewPerson) -> Result<(), ApiError> {
  if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
    return Err(ApiError::BadRequest(
      "firstName and lastName are required".into(),
    ));
  }
  Ok(())
}

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /people`
pub async fn list<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Person>>, ApiError>
where
  S: FamilyStore + 'static,
{
  let people = state
    .store
    .list_people()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(people))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// Person attributes plus optional links to existing people.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonBody {
  #[serde(flatten)]
  pub person:    NewPerson,
  pub father_id: Option<PersonId>,
  pub mother_id: Option<PersonId>,
  pub spouse_id: Option<PersonId>,
}

#[derive(Debug, Serialize)]
pub struct CreatedPerson {
  pub person:        Person,
  /// Every row written, forward edges and their inverses.
  pub relationships: Vec<Relationship>,
}

/// `POST /people`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreatePersonBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: FamilyStore + 'static,
{
  validate_names(&body.person)?;

  let CreatePersonBody { person, father_id, mother_id, spouse_id } = body;

  // Resolve every link before writing anything.
  for (label, id) in [
    ("father", &father_id),
    ("mother", &mother_id),
    ("spouse", &spouse_id),
  ] {
    let Some(id) = id else { continue };
    let exists = state
      .store
      .get_person(id.clone())
      .await
      .map_err(|e| ApiError::Store(Box::new(e)))?
      .is_some();
    if !exists {
      return Err(ApiError::BadRequest(format!("{label} {id} does not exist")));
    }
  }

  let id = PersonId::generate();
  let links: Vec<NewRelationship> = [
    father_id.map(|p| (p, id.clone(), RelationshipKind::Parent)),
    mother_id.map(|p| (p, id.clone(), RelationshipKind::Parent)),
    spouse_id.map(|s| (id.clone(), s, RelationshipKind::Spouse)),
  ]
  .into_iter()
  .flatten()
  .map(|(from_id, to_id, kind)| NewRelationship { from_id, to_id, kind })
  .collect();

  // Person and links are written together; a link that vanished since the
  // check above leaves nothing behind.
  let (person, relationships) = state
    .store
    .add_person_linked(id, person, links)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  tracing::debug!(person = %person.id, links = relationships.len(), "created person");
  Ok((StatusCode::CREATED, Json(CreatedPerson { person, relationships })))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /people/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<Person>, ApiError>
where
  S: FamilyStore + 'static,
{
  let person = state
    .store
    .get_person(id.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /people/{id}`
pub async fn update<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
  Json(body): Json<NewPerson>,
) -> Result<Json<Person>, ApiError>
where
  S: FamilyStore + 'static,
{
  validate_names(&body)?;

  let person = state
    .store
    .update_person(id.clone(), body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(person))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /people/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
) -> Result<StatusCode, ApiError>
where
  S: FamilyStore + 'static,
{
  let deleted = state
    .store
    .delete_person(id.clone())
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  if !deleted {
    return Err(ApiError::NotFound(format!("person {id} not found")));
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Relationships ───────────────────────────────────────────────────────────

/// `GET /people/{id}/relationships`
pub async fn relationships<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<Vec<Relationship>>, ApiError>
where
  S: FamilyStore + 'static,
{
  let rels = state
    .store
    .relationships_for(id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(rels))
}

// ─── Tree ────────────────────────────────────────────────────────────────────

/// `GET /people/{id}/tree`
pub async fn tree<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<PersonId>,
) -> Result<Json<TreeNode>, ApiError>
where
  S: FamilyStore + 'static,
{
  let mut forest =
    family_tree(state.store.as_ref(), Some(&id), state.tree_options).await?;
  // An anchored build yields exactly one tree.
  let root = forest
    .pop()
    .ok_or_else(|| ApiError::NotFound(format!("person {id} not found")))?;
  Ok(Json(root))
}
