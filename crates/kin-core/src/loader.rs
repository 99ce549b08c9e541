//! Relationship Loader: one read of the record store flattened into the
//! shape the tree builder walks.
//!
//! Each [`FlatPerson`] carries two derived id lists:
//!
//! - `parent_ids`: targets of the person's outgoing `child` edges, plus the
//!   sources of incoming `parent` edges. Either direction alone is enough.
//! - `spouse_ids`: outgoing and incoming `spouse` edges merged.
//!
//! Both lists keep first-seen order, hold each id once, and never contain the
//! person's own id.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
  person::PersonId,
  relationship::RelationshipKind,
  store::{FamilyStore, PersonRecord},
};

/// A person annotated with resolved parent and spouse links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatPerson {
  pub id:                PersonId,
  pub first_name:        String,
  pub middle_name:       Option<String>,
  pub last_name:         String,
  pub preferred_name:    Option<String>,
  pub biography:         Option<String>,
  pub personality_tags:  Vec<String>,
  pub profile_photo_ref: Option<String>,
  pub birth_date:        Option<NaiveDate>,
  pub death_date:        Option<NaiveDate>,
  pub is_living:         bool,
  pub parent_ids:        Vec<PersonId>,
  pub spouse_ids:        Vec<PersonId>,
}

impl FlatPerson {
  /// A living person with no links; mostly useful for building snapshots by
  /// hand.
  pub fn new(
    id: impl Into<PersonId>,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      id:                id.into(),
      first_name:        first_name.into(),
      middle_name:       None,
      last_name:         last_name.into(),
      preferred_name:    None,
      biography:         None,
      personality_tags:  Vec::new(),
      profile_photo_ref: None,
      birth_date:        None,
      death_date:        None,
      is_living:         true,
      parent_ids:        Vec::new(),
      spouse_ids:        Vec::new(),
    }
  }

  pub fn with_parents<I, P>(mut self, parents: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PersonId>,
  {
    let existing = std::mem::take(&mut self.parent_ids);
    let ids = parents.into_iter().map(Into::into);
    self.parent_ids = dedup_links(&self.id, existing.into_iter().chain(ids));
    self
  }

  pub fn with_spouses<I, P>(mut self, spouses: I) -> Self
  where
    I: IntoIterator<Item = P>,
    P: Into<PersonId>,
  {
    let existing = std::mem::take(&mut self.spouse_ids);
    let ids = spouses.into_iter().map(Into::into);
    self.spouse_ids = dedup_links(&self.id, existing.into_iter().chain(ids));
    self
  }

  pub fn with_birth_date(mut self, date: NaiveDate) -> Self {
    self.birth_date = Some(date);
    self
  }

  pub fn with_biography(mut self, bio: impl Into<String>) -> Self {
    self.biography = Some(bio.into());
    self
  }
}

impl From<PersonRecord> for FlatPerson {
  fn from(record: PersonRecord) -> Self {
    let PersonRecord { person, profile_photo_path, outgoing, incoming } = record;

    let mut parents = Vec::new();
    let mut spouses = Vec::new();

    for edge in &outgoing {
      match RelationshipKind::from_native(&edge.kind) {
        Some(RelationshipKind::Child) => parents.push(edge.target_id.clone()),
        Some(RelationshipKind::Spouse) => spouses.push(edge.target_id.clone()),
        // Outgoing parent edges point at this person's children; the child's
        // own record picks them up as an incoming parent edge.
        Some(RelationshipKind::Parent) | None => {}
      }
    }

    for edge in &incoming {
      match RelationshipKind::from_native(&edge.kind) {
        Some(RelationshipKind::Parent) => parents.push(edge.source_id.clone()),
        Some(RelationshipKind::Spouse) => spouses.push(edge.source_id.clone()),
        Some(RelationshipKind::Child) | None => {}
      }
    }

    let parent_ids = dedup_links(&person.id, parents);
    let spouse_ids = dedup_links(&person.id, spouses);

    Self {
      id: person.id,
      first_name: person.first_name,
      middle_name: person.middle_name,
      last_name: person.last_name,
      preferred_name: person.preferred_name,
      biography: person.biography,
      personality_tags: person.personality_tags,
      profile_photo_ref: profile_photo_path,
      birth_date: person.birth_date,
      death_date: person.death_date,
      is_living: person.is_living,
      parent_ids,
      spouse_ids,
    }
  }
}

/// First-seen order, no repeats, no self-links.
fn dedup_links(
  own_id: &PersonId,
  ids: impl IntoIterator<Item = PersonId>,
) -> Vec<PersonId> {
  let mut seen = HashSet::new();
  ids
    .into_iter()
    .filter(|id| id != own_id && seen.insert(id.clone()))
    .collect()
}

/// Read the whole population from `store` and flatten it.
///
/// A store failure is returned as-is; nothing is returned partially.
pub async fn load_flat_people<S>(store: &S) -> Result<Vec<FlatPerson>, S::Error>
where
  S: FamilyStore,
{
  let records = store.list_people_with_relationships().await?;
  tracing::debug!(people = records.len(), "loaded family snapshot");
  Ok(records.into_iter().map(FlatPerson::from).collect())
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    person::Person,
    store::{IncomingEdge, OutgoingEdge},
  };

  fn person(id: &str) -> Person {
    let now = Utc::now();
    Person {
      id:               id.into(),
      first_name:       id.into(),
      middle_name:      None,
      last_name:        "Test".into(),
      preferred_name:   None,
      maiden_name:      None,
      gender:           None,
      birth_date:       None,
      birth_place:      None,
      death_date:       None,
      death_place:      None,
      is_living:        true,
      biography:        Some("bio".into()),
      occupation:       None,
      personality_tags: vec!["gardener".into(), "gardener".into()],
      profile_photo_id: None,
      created_at:       now,
      updated_at:       now,
    }
  }

  fn out(kind: &str, target: &str) -> OutgoingEdge {
    OutgoingEdge { kind: kind.into(), target_id: target.into() }
  }

  fn inc(kind: &str, source: &str) -> IncomingEdge {
    IncomingEdge { kind: kind.into(), source_id: source.into() }
  }

  fn record(
    id: &str,
    outgoing: Vec<OutgoingEdge>,
    incoming: Vec<IncomingEdge>,
  ) -> PersonRecord {
    PersonRecord {
      person: person(id),
      profile_photo_path: Some(format!("profile-photos/{id}.jpg")),
      outgoing,
      incoming,
    }
  }

  #[test]
  fn parents_come_from_outgoing_child_edges() {
    let flat = FlatPerson::from(record(
      "emily",
      vec![out("child", "robert"), out("child", "sarah")],
      vec![inc("parent", "robert"), inc("parent", "sarah")],
    ));
    assert_eq!(flat.parent_ids, vec![PersonId::from("robert"), "sarah".into()]);
    assert!(flat.spouse_ids.is_empty());
  }

  #[test]
  fn incoming_parent_edge_alone_is_enough() {
    let flat =
      FlatPerson::from(record("emily", vec![], vec![inc("parent", "robert")]));
    assert_eq!(flat.parent_ids, vec![PersonId::from("robert")]);
  }

  #[test]
  fn spouses_are_merged_from_both_directions_once() {
    let flat = FlatPerson::from(record(
      "robert",
      vec![out("spouse", "sarah"), out("child", "john")],
      vec![inc("spouse", "sarah"), inc("partner", "anne")],
    ));
    assert_eq!(flat.spouse_ids, vec![PersonId::from("sarah"), "anne".into()]);
    assert_eq!(flat.parent_ids, vec![PersonId::from("john")]);
  }

  #[test]
  fn outgoing_parent_and_unknown_kinds_are_ignored() {
    let flat = FlatPerson::from(record(
      "john",
      vec![out("parent", "robert"), out("sibling", "jane")],
      vec![inc("child", "robert"), inc("cousin", "tom")],
    ));
    assert!(flat.parent_ids.is_empty());
    assert!(flat.spouse_ids.is_empty());
  }

  #[test]
  fn self_links_are_dropped() {
    let flat = FlatPerson::from(record(
      "loop",
      vec![out("child", "loop"), out("spouse", "loop")],
      vec![],
    ));
    assert!(flat.parent_ids.is_empty());
    assert!(flat.spouse_ids.is_empty());
  }

  #[test]
  fn attributes_are_carried_over() {
    let flat = FlatPerson::from(record("emily", vec![], vec![]));
    assert_eq!(flat.first_name, "emily");
    assert_eq!(flat.biography.as_deref(), Some("bio"));
    assert_eq!(flat.personality_tags, vec!["gardener", "gardener"]);
    assert_eq!(
      flat.profile_photo_ref.as_deref(),
      Some("profile-photos/emily.jpg")
    );
  }
}
