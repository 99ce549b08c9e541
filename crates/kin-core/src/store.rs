//! The `FamilyStore` trait and the flat record shape it hands to the loader.
//!
//! The trait is implemented by storage backends (e.g. `kin-store-sqlite`).
//! Higher layers (`kin-api`, `kin-server`) depend on this abstraction, not on
//! any concrete backend.

use std::future::Future;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  person::{NewPerson, Person, PersonId},
  relationship::{NewRelationship, Relationship, RelationshipKind},
};

// ─── Bulk read shape ─────────────────────────────────────────────────────────

/// An edge leaving the person, in the store's native kind spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEdge {
  pub kind:      String,
  pub target_id: PersonId,
}

/// An edge arriving at the person, in the store's native kind spelling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingEdge {
  pub kind:      String,
  pub source_id: PersonId,
}

/// One person together with every edge touching them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonRecord {
  pub person:             Person,
  /// Resolved path of the profile photo, relative to the upload directory.
  pub profile_photo_path: Option<String>,
  pub outgoing:           Vec<OutgoingEdge>,
  pub incoming:           Vec<IncomingEdge>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a Kin record-store backend.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait FamilyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  /// Create and persist a new person under a freshly generated id.
  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Create and persist a person with a caller-supplied id.
  ///
  /// Returns an error if the id is already taken.
  fn add_person_with_id(
    &self,
    id: PersonId,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Create a person under `id` together with `links` to existing people,
  /// each stored with its inverse, in one transaction.
  ///
  /// If any linked person is missing nothing is written. Relationship rows
  /// are returned per link, forward edge first.
  fn add_person_linked(
    &self,
    id: PersonId,
    input: NewPerson,
    links: Vec<NewRelationship>,
  ) -> impl Future<Output = Result<(Person, Vec<Relationship>), Self::Error>> + Send + '_;

  /// Retrieve a person by id. Returns `None` if not found.
  fn get_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// List every person in insertion order.
  fn list_people(
    &self,
  ) -> impl Future<Output = Result<Vec<Person>, Self::Error>> + Send + '_;

  /// Replace a person's attributes. The id and `created_at` are kept.
  /// Returns `None` if not found.
  fn update_person(
    &self,
    id: PersonId,
    input: NewPerson,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  /// Delete a person and every relationship touching them. Returns `false`
  /// if not found.
  fn delete_person(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Relationships ─────────────────────────────────────────────────────

  /// Persist exactly one directed edge.
  ///
  /// Returns an error if either person is missing or the edge already
  /// exists.
  fn add_relationship(
    &self,
    input: NewRelationship,
  ) -> impl Future<Output = Result<Relationship, Self::Error>> + Send + '_;

  /// Persist an edge together with its inverse in one transaction.
  ///
  /// Rows that already exist are kept as they are; both rows are returned,
  /// forward edge first.
  fn relate(
    &self,
    from_id: PersonId,
    to_id: PersonId,
    kind: RelationshipKind,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  fn list_relationships(
    &self,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  /// Every edge where `id` is either end.
  fn relationships_for(
    &self,
    id: PersonId,
  ) -> impl Future<Output = Result<Vec<Relationship>, Self::Error>> + Send + '_;

  /// Delete an edge and its inverse. Returns `false` if the edge was not
  /// found.
  fn delete_relationship(
    &self,
    relationship_id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Bulk read ─────────────────────────────────────────────────────────

  /// Every person with every edge, in one call.
  fn list_people_with_relationships(
    &self,
  ) -> impl Future<Output = Result<Vec<PersonRecord>, Self::Error>> + Send + '_;
}
