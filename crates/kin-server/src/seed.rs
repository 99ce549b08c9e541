//! Demo family used by `kin-server --seed`.
//!
//! Three generations of the Smith family, linked with one-directional edges
//! only (each child points at its parents, each marriage is recorded once) so
//! the tree builder's inference is exercised on real data.

use std::collections::HashSet;

use chrono::NaiveDate;
use kin_core::{
  person::{NewPerson, PersonId},
  relationship::{NewRelationship, RelationshipKind},
  store::FamilyStore,
};

struct SeedPerson {
  id:         &'static str,
  first_name: &'static str,
  maiden:     Option<&'static str>,
  born:       (i32, u32, u32),
  died:       Option<(i32, u32, u32)>,
  occupation: &'static str,
  tags:       [&'static str; 3],
  biography:  &'static str,
}

const PEOPLE: &[SeedPerson] = &[
  SeedPerson {
    id:         "grandpa-john",
    first_name: "John",
    maiden:     None,
    born:       (1940, 3, 15),
    died:       Some((2020, 8, 22)),
    occupation: "Farmer",
    tags:       ["storyteller", "gardener", "wise"],
    biography:  "A passionate storyteller and gardener who loved sharing tales from the past. His wisdom and gentle nature touched everyone he met.",
  },
  SeedPerson {
    id:         "grandma-mary",
    first_name: "Mary",
    maiden:     Some("Johnson"),
    born:       (1942, 7, 20),
    died:       Some((2022, 1, 10)),
    occupation: "Music Teacher",
    tags:       ["musician", "teacher", "caring"],
    biography:  "A talented musician and devoted teacher who filled our home with music and laughter. Her piano lessons were legendary.",
  },
  SeedPerson {
    id:         "dad-robert",
    first_name: "Robert",
    maiden:     None,
    born:       (1965, 5, 10),
    died:       None,
    occupation: "Software Engineer",
    tags:       ["engineer", "adventurer", "tech-savvy"],
    biography:  "An innovative engineer and tech enthusiast with a love for adventure. Always ready with a joke and a helping hand.",
  },
  SeedPerson {
    id:         "mom-sarah",
    first_name: "Sarah",
    maiden:     Some("Williams"),
    born:       (1968, 9, 14),
    died:       None,
    occupation: "School Principal",
    tags:       ["educator", "volunteer", "creative"],
    biography:  "A dedicated educator and community volunteer with a heart for helping others. Her creativity and kindness inspire everyone.",
  },
  SeedPerson {
    id:         "uncle-michael",
    first_name: "Michael",
    maiden:     None,
    born:       (1970, 11, 3),
    died:       None,
    occupation: "Restaurant Owner",
    tags:       ["chef", "foodie", "sociable"],
    biography:  "A master chef who brings everyone together around the table. His culinary skills and warm personality are legendary.",
  },
  SeedPerson {
    id:         "aunt-emma",
    first_name: "Emma",
    maiden:     Some("Brown"),
    born:       (1972, 2, 18),
    died:       None,
    occupation: "Author",
    tags:       ["writer", "traveler", "creative"],
    biography:  "A creative writer and world traveler whose stories captivate audiences. Her adventurous spirit makes her unforgettable.",
  },
  SeedPerson {
    id:         "child-emily",
    first_name: "Emily",
    maiden:     None,
    born:       (1995, 6, 22),
    died:       None,
    occupation: "Graphic Designer",
    tags:       ["artist", "environmentalist", "creative"],
    biography:  "A talented artist with a passion for environmental causes. She brings creativity and compassion to everything she does.",
  },
  SeedPerson {
    id:         "child-daniel",
    first_name: "Daniel",
    maiden:     None,
    born:       (1998, 4, 15),
    died:       None,
    occupation: "Music Producer",
    tags:       ["musician", "songwriter", "performer"],
    biography:  "An aspiring musician following in his grandmother's footsteps. His guitar skills and songwriting talent shine bright.",
  },
];

const EDGES: &[(&str, &str, RelationshipKind)] = &[
  ("grandpa-john", "grandma-mary", RelationshipKind::Spouse),
  ("dad-robert", "mom-sarah", RelationshipKind::Spouse),
  ("uncle-michael", "aunt-emma", RelationshipKind::Spouse),
  ("dad-robert", "grandpa-john", RelationshipKind::Child),
  ("dad-robert", "grandma-mary", RelationshipKind::Child),
  ("uncle-michael", "grandpa-john", RelationshipKind::Child),
  ("uncle-michael", "grandma-mary", RelationshipKind::Child),
  ("child-emily", "dad-robert", RelationshipKind::Child),
  ("child-emily", "mom-sarah", RelationshipKind::Child),
  ("child-daniel", "dad-robert", RelationshipKind::Child),
  ("child-daniel", "mom-sarah", RelationshipKind::Child),
];

/// What a seeding run actually wrote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
  pub people:        usize,
  pub relationships: usize,
}

fn date((y, m, d): (i32, u32, u32)) -> Option<NaiveDate> {
  NaiveDate::from_ymd_opt(y, m, d)
}

fn new_person(seed: &SeedPerson) -> NewPerson {
  NewPerson {
    maiden_name: seed.maiden.map(Into::into),
    birth_date: date(seed.born),
    death_date: seed.died.and_then(date),
    is_living: seed.died.is_none(),
    biography: Some(seed.biography.into()),
    occupation: Some(seed.occupation.into()),
    personality_tags: seed.tags.iter().map(|t| (*t).to_owned()).collect(),
    ..NewPerson::new(seed.first_name, "Smith")
  }
}

/// Insert the demo family. People and edges that are already present are
/// left alone, so running this twice writes nothing the second time.
pub async fn seed_demo_family<S>(store: &S) -> Result<SeedReport, S::Error>
where
  S: FamilyStore,
{
  let mut report = SeedReport::default();

  for seed in PEOPLE {
    let id = PersonId::new(seed.id);
    if store.get_person(id.clone()).await?.is_some() {
      continue;
    }
    store.add_person_with_id(id, new_person(seed)).await?;
    report.people += 1;
  }

  let existing: HashSet<(PersonId, PersonId, RelationshipKind)> = store
    .list_relationships()
    .await?
    .into_iter()
    .map(|r| (r.from_id, r.to_id, r.kind))
    .collect();

  for (from, to, kind) in EDGES {
    let key = (PersonId::new(*from), PersonId::new(*to), *kind);
    if existing.contains(&key) {
      continue;
    }
    let (from_id, to_id, kind) = key;
    store
      .add_relationship(NewRelationship { from_id, to_id, kind })
      .await?;
    report.relationships += 1;
  }

  tracing::info!(
    people = report.people,
    relationships = report.relationships,
    "seeded demo family"
  );
  Ok(report)
}

#[cfg(test)]
mod tests {
  use super::*;

  use kin_core::{TreeOptions, family_tree};
  use kin_store_sqlite::SqliteStore;

  #[tokio::test]
  async fn seeding_twice_writes_once() {
    let store = SqliteStore::open_in_memory().await.unwrap();

    let first = seed_demo_family(&store).await.unwrap();
    assert_eq!(first, SeedReport { people: 8, relationships: 11 });

    let second = seed_demo_family(&store).await.unwrap();
    assert_eq!(second, SeedReport::default());
    assert_eq!(store.list_people().await.unwrap().len(), 8);
  }

  #[tokio::test]
  async fn demo_family_forms_one_tree() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    seed_demo_family(&store).await.unwrap();

    let forest = family_tree(&store, None, TreeOptions::default()).await.unwrap();
    assert_eq!(forest.len(), 1);

    let root = &forest[0];
    assert_eq!(root.id().as_str(), "grandpa-john");
    assert_eq!(root.spouses.len(), 1);
    assert_eq!(root.spouses[0].id.as_str(), "grandma-mary");
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.node_count(), 5);
    assert_eq!(root.generations(), 3);

    let robert = root.find("dad-robert").unwrap();
    assert_eq!(robert.spouses[0].id.as_str(), "mom-sarah");
    assert_eq!(robert.children.len(), 2);
  }
}
