//! Error type for `kin-store-sqlite`.

use kin_core::{person::PersonId, relationship::RelationshipKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] kin_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its closed set.
  #[error("invalid column value: {0}")]
  InvalidColumn(String),

  #[error("person not found: {0}")]
  PersonNotFound(PersonId),

  #[error("person already exists: {0}")]
  PersonExists(PersonId),

  #[error("relationship {from} -{kind}-> {to} already exists")]
  DuplicateRelationship {
    from: PersonId,
    to:   PersonId,
    kind: RelationshipKind,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
