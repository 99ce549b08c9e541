//! [`SqliteStore`]: the SQLite implementation of [`FamilyStore`] and
//! [`MediaStore`].

use std::{collections::HashMap, path::Path};

use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use kin_core::{
  media::{Media, MediaStore, MediaUpdate, NewMedia},
  person::{NewPerson, Person, PersonId},
  relationship::{NewRelationship, Relationship, RelationshipKind},
  store::{FamilyStore, IncomingEdge, OutgoingEdge, PersonRecord},
};

use crate::{
  encode::{
    MEDIA_COLUMNS, PERSON_COLUMNS, PERSON_COLUMN_COUNT, RELATIONSHIP_COLUMNS,
    RawMedia, RawPerson, RawRelationship, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
  Error, Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Kin family store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, e.g. for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn require_person(&self, id: &PersonId) -> Result<()> {
    let id_str = id.to_string();
    let exists = self
      .conn
      .call(move |conn| Ok(person_exists(conn, &id_str)?))
      .await?;

    if exists { Ok(()) } else { Err(Error::PersonNotFound(id.clone())) }
  }

  /// Insert a fully-built [`Person`]. Returns `false` if the id is taken.
  async fn insert_person(&self, person: &Person) -> Result<bool> {
    let raw = RawPerson::from_person(person)?;

    let inserted = self
      .conn
      .call(move |conn| Ok(insert_person_row(conn, &raw)? == 1))
      .await?;

    Ok(inserted)
  }

  async fn query_relationships(
    &self,
    person: Option<PersonId>,
  ) -> Result<Vec<Relationship>> {
    let person_str = person.map(|p| p.to_string());

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(id) = person_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
             WHERE from_id = ?1 OR to_id = ?1 ORDER BY rowid"
          ))?;
          stmt
            .query_map(rusqlite::params![id], RawRelationship::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships ORDER BY rowid"
          ))?;
          stmt
            .query_map([], RawRelationship::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    // Rows of kinds the tree does not model are left out of typed listings.
    raws
      .into_iter()
      .filter(|r| RelationshipKind::from_native(&r.kind).is_some())
      .map(RawRelationship::into_relationship)
      .collect()
  }

  async fn query_one_media(&self, sql: String, id: String) -> Result<Option<Media>> {
    let raw: Option<RawMedia> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id], RawMedia::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawMedia::into_media).transpose()
  }
}

// ─── Row helpers ─────────────────────────────────────────────────────────────

const INSERT_PERSON: &str = "INSERT OR IGNORE INTO people (
     person_id, first_name, middle_name, last_name, preferred_name,
     maiden_name, gender, birth_date, birth_place, death_date,
     death_place, is_living, biography, occupation, personality_tags,
     profile_photo_id, created_at, updated_at
   ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
             ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)";

/// Returns the number of rows written: 0 if the id is taken.
fn insert_person_row(
  conn: &rusqlite::Connection,
  raw: &RawPerson,
) -> rusqlite::Result<usize> {
  conn.execute(INSERT_PERSON, rusqlite::params![
    raw.person_id,
    raw.first_name,
    raw.middle_name,
    raw.last_name,
    raw.preferred_name,
    raw.maiden_name,
    raw.gender,
    raw.birth_date,
    raw.birth_place,
    raw.death_date,
    raw.death_place,
    raw.is_living,
    raw.biography,
    raw.occupation,
    raw.personality_tags,
    raw.profile_photo_id,
    raw.created_at,
    raw.updated_at,
  ])
}

fn person_exists(conn: &rusqlite::Connection, id: &str) -> rusqlite::Result<bool> {
  Ok(
    conn
      .query_row(
        "SELECT 1 FROM people WHERE person_id = ?1",
        rusqlite::params![id],
        |_| Ok(true),
      )
      .optional()?
      .unwrap_or(false),
  )
}

/// One relationship row ready to bind, with a fresh id.
struct EdgeRow {
  relationship_id: String,
  from_id:         String,
  to_id:           String,
  kind:            &'static str,
}

/// Each edge followed by its inverse.
fn mirrored_rows(edges: &[NewRelationship]) -> Vec<EdgeRow> {
  edges
    .iter()
    .flat_map(|e| [e.clone(), e.inverse()])
    .map(|r| EdgeRow {
      relationship_id: encode_uuid(Uuid::new_v4()),
      from_id:         r.from_id.to_string(),
      to_id:           r.to_id.to_string(),
      kind:            r.kind.as_str(),
    })
    .collect()
}

/// Insert `rows`, keeping any that already exist, and read every row back.
fn insert_mirrored(
  conn: &rusqlite::Connection,
  rows: &[EdgeRow],
  created_at: &str,
) -> rusqlite::Result<Vec<RawRelationship>> {
  let mut insert = conn.prepare(
    "INSERT OR IGNORE INTO relationships
       (relationship_id, from_id, to_id, kind, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;
  let mut select = conn.prepare(&format!(
    "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
     WHERE from_id = ?1 AND to_id = ?2 AND kind = ?3"
  ))?;

  let mut out = Vec::with_capacity(rows.len());
  for row in rows {
    insert.execute(rusqlite::params![
      row.relationship_id,
      row.from_id,
      row.to_id,
      row.kind,
      created_at
    ])?;
    out.push(select.query_row(
      rusqlite::params![row.from_id, row.to_id, row.kind],
      RawRelationship::from_row,
    )?);
  }
  Ok(out)
}

fn build_person(
  id: PersonId,
  input: NewPerson,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
) -> Person {
  Person {
    id,
    first_name: input.first_name,
    middle_name: input.middle_name,
    last_name: input.last_name,
    preferred_name: input.preferred_name,
    maiden_name: input.maiden_name,
    gender: input.gender,
    birth_date: input.birth_date,
    birth_place: input.birth_place,
    death_date: input.death_date,
    death_place: input.death_place,
    is_living: input.is_living,
    biography: input.biography,
    occupation: input.occupation,
    personality_tags: input.personality_tags,
    profile_photo_id: input.profile_photo_id,
    created_at,
    updated_at,
  }
}

// ─── FamilyStore impl ────────────────────────────────────────────────────────

impl FamilyStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    self.add_person_with_id(PersonId::generate(), input).await
  }

  async fn add_person_with_id(
    &self,
    id: PersonId,
    input: NewPerson,
  ) -> Result<Person> {
    let now = Utc::now();
    let person = build_person(id, input, now, now);

    if !self.insert_person(&person).await? {
      return Err(Error::PersonExists(person.id));
    }
    Ok(person)
  }

  async fn add_person_linked(
    &self,
    id: PersonId,
    input: NewPerson,
    links: Vec<NewRelationship>,
  ) -> Result<(Person, Vec<Relationship>)> {
    if let Some(link) = links.iter().find(|l| l.from_id == l.to_id) {
      return Err(kin_core::Error::SelfRelationship(link.from_id.clone()).into());
    }

    let now = Utc::now();
    let person = build_person(id, input, now, now);
    let raw = RawPerson::from_person(&person)?;
    let new_id = person.id.to_string();
    let rows = mirrored_rows(&links);
    let at_str = encode_dt(now);

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if insert_person_row(&tx, &raw)? == 0 {
          return Ok(Err(Error::PersonExists(PersonId::new(new_id))));
        }
        for row in &rows {
          for end in [&row.from_id, &row.to_id] {
            if *end != new_id && !person_exists(&tx, end)? {
              // Dropping `tx` rolls the person back too.
              return Ok(Err(Error::PersonNotFound(PersonId::new(end.clone()))));
            }
          }
        }
        let out = insert_mirrored(&tx, &rows, &at_str)?;
        tx.commit()?;
        Ok(Ok(out))
      })
      .await??;

    let relationships = raws
      .into_iter()
      .map(RawRelationship::into_relationship)
      .collect::<Result<_>>()?;
    Ok((person, relationships))
  }

  async fn get_person(&self, id: PersonId) -> Result<Option<Person>> {
    let id_str = id.to_string();

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PERSON_COLUMNS} FROM people p WHERE p.person_id = ?1"),
              rusqlite::params![id_str],
              RawPerson::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  async fn list_people(&self) -> Result<Vec<Person>> {
    let raws: Vec<RawPerson> = self
      .conn
      .call(|conn| {
        let mut stmt =
          conn.prepare(&format!("SELECT {PERSON_COLUMNS} FROM people p ORDER BY p.rowid"))?;
        let rows = stmt
          .query_map([], RawPerson::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawPerson::into_person).collect()
  }

  async fn update_person(
    &self,
    id: PersonId,
    input: NewPerson,
  ) -> Result<Option<Person>> {
    let existing = match self.get_person(id.clone()).await? {
      Some(p) => p,
      None => return Ok(None),
    };

    let person = build_person(id, input, existing.created_at, Utc::now());
    let raw = RawPerson::from_person(&person)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE people SET
             first_name = ?2, middle_name = ?3, last_name = ?4,
             preferred_name = ?5, maiden_name = ?6, gender = ?7,
             birth_date = ?8, birth_place = ?9, death_date = ?10,
             death_place = ?11, is_living = ?12, biography = ?13,
             occupation = ?14, personality_tags = ?15,
             profile_photo_id = ?16, updated_at = ?17
           WHERE person_id = ?1",
          rusqlite::params![
            raw.person_id,
            raw.first_name,
            raw.middle_name,
            raw.last_name,
            raw.preferred_name,
            raw.maiden_name,
            raw.gender,
            raw.birth_date,
            raw.birth_place,
            raw.death_date,
            raw.death_place,
            raw.is_living,
            raw.biography,
            raw.occupation,
            raw.personality_tags,
            raw.profile_photo_id,
            raw.updated_at,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(Some(person))
  }

  async fn delete_person(&self, id: PersonId) -> Result<bool> {
    let id_str = id.to_string();

    // Relationship rows go with the person (ON DELETE CASCADE).
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM people WHERE person_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    Ok(n > 0)
  }

  // ── Relationships ─────────────────────────────────────────────────────────

  async fn add_relationship(&self, input: NewRelationship) -> Result<Relationship> {
    if input.from_id == input.to_id {
      return Err(kin_core::Error::SelfRelationship(input.from_id).into());
    }
    self.require_person(&input.from_id).await?;
    self.require_person(&input.to_id).await?;

    let rel = Relationship {
      relationship_id: Uuid::new_v4(),
      from_id:         input.from_id,
      to_id:           input.to_id,
      kind:            input.kind,
      created_at:      Utc::now(),
    };

    let id_str   = encode_uuid(rel.relationship_id);
    let from_str = rel.from_id.to_string();
    let to_str   = rel.to_id.to_string();
    let kind_str = rel.kind.as_str();
    let at_str   = encode_dt(rel.created_at);

    let inserted = self
      .conn
      .call(move |conn| {
        let n = conn.execute(
          "INSERT OR IGNORE INTO relationships
             (relationship_id, from_id, to_id, kind, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, from_str, to_str, kind_str, at_str],
        )?;
        Ok(n == 1)
      })
      .await?;

    if !inserted {
      return Err(Error::DuplicateRelationship {
        from: rel.from_id,
        to:   rel.to_id,
        kind: rel.kind,
      });
    }
    Ok(rel)
  }

  async fn relate(
    &self,
    from_id: PersonId,
    to_id: PersonId,
    kind: RelationshipKind,
  ) -> Result<Vec<Relationship>> {
    let forward = NewRelationship::new(from_id, to_id, kind)?;
    self.require_person(&forward.from_id).await?;
    self.require_person(&forward.to_id).await?;

    let at_str = encode_dt(Utc::now());
    let rows = mirrored_rows(std::slice::from_ref(&forward));

    let raws: Vec<RawRelationship> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let out = insert_mirrored(&tx, &rows, &at_str)?;
        tx.commit()?;
        Ok(out)
      })
      .await?;

    raws.into_iter().map(RawRelationship::into_relationship).collect()
  }

  async fn list_relationships(&self) -> Result<Vec<Relationship>> {
    self.query_relationships(None).await
  }

  async fn relationships_for(&self, id: PersonId) -> Result<Vec<Relationship>> {
    self.query_relationships(Some(id)).await
  }

  async fn delete_relationship(&self, relationship_id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(relationship_id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let row: Option<(String, String, String)> = tx
          .query_row(
            "SELECT from_id, to_id, kind FROM relationships WHERE relationship_id = ?1",
            rusqlite::params![id_str],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
          )
          .optional()?;

        let Some((from, to, kind)) = row else {
          return Ok(false);
        };

        tx.execute(
          "DELETE FROM relationships WHERE relationship_id = ?1",
          rusqlite::params![id_str],
        )?;
        if let Some(inverse) = RelationshipKind::from_native(&kind).map(RelationshipKind::inverse) {
          tx.execute(
            "DELETE FROM relationships WHERE from_id = ?1 AND to_id = ?2 AND kind = ?3",
            rusqlite::params![to, from, inverse.as_str()],
          )?;
        }
        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(deleted)
  }

  // ── Bulk read ─────────────────────────────────────────────────────────────

  async fn list_people_with_relationships(&self) -> Result<Vec<PersonRecord>> {
    type RawEdge = (String, String, String);

    let (people, edges): (Vec<(RawPerson, Option<String>)>, Vec<RawEdge>) = self
      .conn
      .call(|conn| {
        // The profile photo path falls back to the newest featured image.
        let mut stmt = conn.prepare(&format!(
          "SELECT {PERSON_COLUMNS},
             COALESCE(
               m.file_path,
               (SELECT f.file_path FROM media f
                WHERE f.person_id = p.person_id AND f.is_featured = 1
                ORDER BY f.rowid DESC LIMIT 1)
             )
           FROM people p
           LEFT JOIN media m ON m.media_id = p.profile_photo_id
           ORDER BY p.rowid"
        ))?;
        let people = stmt
          .query_map([], |row| {
            Ok((RawPerson::from_row(row)?, row.get(PERSON_COLUMN_COUNT)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt =
          conn.prepare("SELECT from_id, to_id, kind FROM relationships ORDER BY rowid")?;
        let edges = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((people, edges))
      })
      .await?;

    let mut records = Vec::with_capacity(people.len());
    let mut index: HashMap<String, usize> = HashMap::with_capacity(people.len());
    for (raw, profile_photo_path) in people {
      index.insert(raw.person_id.clone(), records.len());
      records.push(PersonRecord {
        person: raw.into_person()?,
        profile_photo_path,
        outgoing: Vec::new(),
        incoming: Vec::new(),
      });
    }

    for (from, to, kind) in edges {
      if let Some(&i) = index.get(&from) {
        records[i].outgoing.push(OutgoingEdge {
          kind:      kind.clone(),
          target_id: PersonId::new(to.clone()),
        });
      }
      if let Some(&i) = index.get(&to) {
        records[i].incoming.push(IncomingEdge { kind, source_id: PersonId::new(from) });
      }
    }

    Ok(records)
  }
}

// ─── MediaStore impl ─────────────────────────────────────────────────────────

impl MediaStore for SqliteStore {
  type Error = Error;

  async fn add_media(&self, input: NewMedia) -> Result<Media> {
    let media = Media {
      media_id:           Uuid::new_v4(),
      person_id:          input.person_id,
      kind:               input.kind,
      file_name:          input.file_name,
      original_file_name: input.original_file_name,
      file_path:          input.file_path,
      media_type:         input.media_type,
      file_size:          input.file_size,
      content_hash:       input.content_hash,
      title:              input.title,
      caption:            input.caption,
      is_featured:        input.is_featured,
      created_at:         Utc::now(),
    };

    let id_str        = encode_uuid(media.media_id);
    let person_str    = media.person_id.as_ref().map(PersonId::to_string);
    let kind_str      = media.kind.as_str();
    let file_name     = media.file_name.clone();
    let original_name = media.original_file_name.clone();
    let file_path     = media.file_path.clone();
    let media_type    = media.media_type.clone();
    let file_size     = i64::try_from(media.file_size).unwrap_or(i64::MAX);
    let content_hash  = media.content_hash.clone();
    let title         = media.title.clone();
    let caption       = media.caption.clone();
    let is_featured   = media.is_featured;
    let at_str        = encode_dt(media.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO media (
             media_id, person_id, kind, file_name, original_file_name,
             file_path, media_type, file_size, content_hash, title, caption,
             is_featured, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
          rusqlite::params![
            id_str,
            person_str,
            kind_str,
            file_name,
            original_name,
            file_path,
            media_type,
            file_size,
            content_hash,
            title,
            caption,
            is_featured,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(media)
  }

  async fn get_media(&self, id: Uuid) -> Result<Option<Media>> {
    self
      .query_one_media(
        format!("SELECT {MEDIA_COLUMNS} FROM media m WHERE m.media_id = ?1"),
        encode_uuid(id),
      )
      .await
  }

  async fn list_media_for_person(
    &self,
    person_id: PersonId,
    featured_only: bool,
  ) -> Result<Vec<Media>> {
    let person_str = person_id.to_string();

    let raws: Vec<RawMedia> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MEDIA_COLUMNS} FROM media m
           WHERE m.person_id = ?1 AND (?2 = 0 OR m.is_featured = 1)
           ORDER BY m.is_featured DESC, m.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![person_str, featured_only], RawMedia::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawMedia::into_media).collect()
  }

  async fn update_media(&self, id: Uuid, update: MediaUpdate) -> Result<Option<Media>> {
    let id_str = encode_uuid(id);
    let MediaUpdate { title, caption, is_featured } = update;

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE media SET
             title       = COALESCE(?2, title),
             caption     = COALESCE(?3, caption),
             is_featured = COALESCE(?4, is_featured)
           WHERE media_id = ?1",
          rusqlite::params![id_str, title, caption, is_featured],
        )?)
      })
      .await?;

    if n == 0 {
      return Ok(None);
    }
    self.get_media(id).await
  }

  async fn delete_media(&self, id: Uuid) -> Result<Option<Media>> {
    let Some(media) = self.get_media(id).await? else {
      return Ok(None);
    };

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE people SET profile_photo_id = NULL WHERE profile_photo_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM media WHERE media_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(())
      })
      .await?;

    Ok(Some(media))
  }

  async fn set_profile_photo(
    &self,
    person_id: PersonId,
    media_id: Option<Uuid>,
  ) -> Result<bool> {
    let person_str = person_id.to_string();
    let media_str  = media_id.map(encode_uuid);
    let at_str     = encode_dt(Utc::now());

    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE people SET profile_photo_id = ?2, updated_at = ?3 WHERE person_id = ?1",
          rusqlite::params![person_str, media_str, at_str],
        )?)
      })
      .await?;

    Ok(n > 0)
  }

  async fn profile_photo(&self, person_id: PersonId) -> Result<Option<Media>> {
    let person_str = person_id.to_string();

    let explicit = self
      .query_one_media(
        format!(
          "SELECT {MEDIA_COLUMNS} FROM people p
           JOIN media m ON m.media_id = p.profile_photo_id
           WHERE p.person_id = ?1"
        ),
        person_str.clone(),
      )
      .await?;
    if explicit.is_some() {
      return Ok(explicit);
    }

    self
      .query_one_media(
        format!(
          "SELECT {MEDIA_COLUMNS} FROM media m
           WHERE m.person_id = ?1 AND m.is_featured = 1
           ORDER BY m.rowid DESC LIMIT 1"
        ),
        person_str,
      )
      .await
  }
}
