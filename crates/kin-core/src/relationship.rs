//! Directed, typed edges between two people.
//!
//! The direction matters for `parent`/`child`: `A -parent-> B` reads "A is
//! parent of B", and its inverse is `B -child-> A`. Spouse edges mean the
//! same in either direction but are still stored as two directed rows.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result, person::PersonId};

/// The closed set of relationship kinds the tree understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
  Parent,
  Child,
  Spouse,
}

impl RelationshipKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Parent => "parent",
      Self::Child => "child",
      Self::Spouse => "spouse",
    }
  }

  /// The kind of the edge pointing back the other way.
  pub fn inverse(self) -> Self {
    match self {
      Self::Parent => Self::Child,
      Self::Child => Self::Parent,
      Self::Spouse => Self::Spouse,
    }
  }

  /// Translate a record-store kind string into the closed set.
  ///
  /// `"partner"` is an older spelling of spouse. Kinds the tree has no use
  /// for (`"sibling"`, `"guardian"`, ...) yield `None`.
  pub fn from_native(s: &str) -> Option<Self> {
    match s.trim().to_ascii_lowercase().as_str() {
      "parent" => Some(Self::Parent),
      "child" => Some(Self::Child),
      "spouse" | "partner" => Some(Self::Spouse),
      _ => None,
    }
  }
}

impl fmt::Display for RelationshipKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for RelationshipKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    Self::from_native(s).ok_or_else(|| Error::UnknownRelationshipKind(s.to_owned()))
  }
}

/// A stored relationship row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
  pub relationship_id: Uuid,
  pub from_id:         PersonId,
  pub to_id:           PersonId,
  pub kind:            RelationshipKind,
  pub created_at:      DateTime<Utc>,
}

impl Relationship {
  /// Whether `other` is the mirror image of this edge.
  pub fn is_inverse_of(&self, other: &Relationship) -> bool {
    self.from_id == other.to_id
      && self.to_id == other.from_id
      && self.kind.inverse() == other.kind
  }
}

/// Input to [`crate::store::FamilyStore::add_relationship`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRelationship {
  pub from_id: PersonId,
  pub to_id:   PersonId,
  pub kind:    RelationshipKind,
}

impl NewRelationship {
  /// Rejects an edge from a person to themselves.
  pub fn new(
    from_id: PersonId,
    to_id: PersonId,
    kind: RelationshipKind,
  ) -> Result<Self> {
    if from_id == to_id {
      return Err(Error::SelfRelationship(from_id));
    }
    Ok(Self { from_id, to_id, kind })
  }

  /// The same edge pointing the other way.
  pub fn inverse(&self) -> Self {
    Self {
      from_id: self.to_id.clone(),
      to_id:   self.from_id.clone(),
      kind:    self.kind.inverse(),
    }
  }
}
