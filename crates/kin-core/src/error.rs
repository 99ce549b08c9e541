//! Error types for `kin-core`.

use thiserror::Error;

use crate::person::PersonId;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown relationship kind: {0:?}")]
  UnknownRelationshipKind(String),

  #[error("a person cannot be related to themselves: {0}")]
  SelfRelationship(PersonId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
