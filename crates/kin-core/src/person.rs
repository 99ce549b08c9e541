//! Person: one individual in the family tree.
//!
//! A person is a flat record; everything that links people together lives
//! in the relationship table (see [`crate::relationship`]).

use std::{borrow::Borrow, fmt};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Identifier ──────────────────────────────────────────────────────────────

/// Stable, opaque person identifier. Immutable once assigned.
///
/// Generated identifiers are hyphenated UUIDs, but any non-empty string is
/// accepted so that imported or seeded records can keep readable ids such as
/// `grandpa-john`.
#[derive(
  Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PersonId(String);

impl PersonId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  /// A fresh random identifier.
  pub fn generate() -> Self { Self(Uuid::new_v4().hyphenated().to_string()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for PersonId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for PersonId {
  fn from(s: &str) -> Self { Self(s.to_owned()) }
}

impl From<String> for PersonId {
  fn from(s: String) -> Self { Self(s) }
}

impl AsRef<str> for PersonId {
  fn as_ref(&self) -> &str { &self.0 }
}

impl Borrow<str> for PersonId {
  fn borrow(&self) -> &str { &self.0 }
}

// ─── Person ──────────────────────────────────────────────────────────────────

/// A stored person record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
  pub id:               PersonId,
  pub first_name:       String,
  pub middle_name:      Option<String>,
  pub last_name:        String,
  pub preferred_name:   Option<String>,
  pub maiden_name:      Option<String>,
  pub gender:           Option<String>,
  pub birth_date:       Option<NaiveDate>,
  pub birth_place:      Option<String>,
  /// Only meaningful when `is_living` is `false`; may still be unknown.
  pub death_date:       Option<NaiveDate>,
  pub death_place:      Option<String>,
  pub is_living:        bool,
  pub biography:        Option<String>,
  pub occupation:       Option<String>,
  /// Free-form tags; order is preserved and duplicates are allowed.
  pub personality_tags: Vec<String>,
  /// Media record owned by the media store.
  pub profile_photo_id: Option<Uuid>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

impl Person {
  /// `preferred_name`, falling back to "First Last".
  pub fn display_name(&self) -> String {
    match &self.preferred_name {
      Some(p) if !p.trim().is_empty() => p.clone(),
      _ => format!("{} {}", self.first_name, self.last_name),
    }
  }

  /// "First Middle Last" with the middle name omitted when absent.
  pub fn full_name(&self) -> String {
    [
      Some(self.first_name.as_str()),
      self.middle_name.as_deref(),
      Some(self.last_name.as_str()),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .collect::<Vec<_>>()
    .join(" ")
  }
}

// ─── NewPerson ───────────────────────────────────────────────────────────────

/// Input to [`crate::store::FamilyStore::add_person`] and
/// [`crate::store::FamilyStore::update_person`]. Identity and timestamps are
/// always set by the store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPerson {
  pub first_name:       String,
  pub middle_name:      Option<String>,
  pub last_name:        String,
  pub preferred_name:   Option<String>,
  pub maiden_name:      Option<String>,
  pub gender:           Option<String>,
  pub birth_date:       Option<NaiveDate>,
  pub birth_place:      Option<String>,
  pub death_date:       Option<NaiveDate>,
  pub death_place:      Option<String>,
  #[serde(default = "default_living")]
  pub is_living:        bool,
  pub biography:        Option<String>,
  pub occupation:       Option<String>,
  #[serde(default)]
  pub personality_tags: Vec<String>,
  pub profile_photo_id: Option<Uuid>,
}

fn default_living() -> bool { true }

impl NewPerson {
  /// Convenience constructor with every optional field empty.
  pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
    Self {
      first_name: first_name.into(),
      last_name: last_name.into(),
      is_living: true,
      ..Default::default()
    }
  }
}
