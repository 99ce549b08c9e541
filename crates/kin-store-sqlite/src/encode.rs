//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, calendar dates `YYYY-MM-DD`, tags a JSON
//! array, UUIDs hyphenated lowercase strings.

use chrono::{DateTime, NaiveDate, Utc};
use kin_core::{
  media::{Media, MediaKind},
  person::{Person, PersonId},
  relationship::{Relationship, RelationshipKind},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── NaiveDate ───────────────────────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn encode_date(d: NaiveDate) -> String { d.format(DATE_FORMAT).to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, DATE_FORMAT)
    .map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── MediaKind ───────────────────────────────────────────────────────────────

pub fn decode_media_kind(s: &str) -> Result<MediaKind> {
  match s {
    "profile" => Ok(MediaKind::Profile),
    "gallery" => Ok(MediaKind::Gallery),
    other => Err(Error::InvalidColumn(format!("unknown media kind: {other:?}"))),
  }
}

// ─── Tags ────────────────────────────────────────────────────────────────────

pub fn encode_tags(tags: &[String]) -> Result<String> {
  Ok(serde_json::to_string(tags)?)
}

pub fn decode_tags(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawPerson::from_row`]; expects `people` aliased `p`.
pub const PERSON_COLUMNS: &str = "
  p.person_id, p.first_name, p.middle_name, p.last_name, p.preferred_name,
  p.maiden_name, p.gender, p.birth_date, p.birth_place, p.death_date,
  p.death_place, p.is_living, p.biography, p.occupation, p.personality_tags,
  p.profile_photo_id, p.created_at, p.updated_at";

/// Number of columns in [`PERSON_COLUMNS`].
pub const PERSON_COLUMN_COUNT: usize = 18;

/// Raw values read directly from a `people` row.
pub struct RawPerson {
  pub person_id:        String,
  pub first_name:       String,
  pub middle_name:      Option<String>,
  pub last_name:        String,
  pub preferred_name:   Option<String>,
  pub maiden_name:      Option<String>,
  pub gender:           Option<String>,
  pub birth_date:       Option<String>,
  pub birth_place:      Option<String>,
  pub death_date:       Option<String>,
  pub death_place:      Option<String>,
  pub is_living:        bool,
  pub biography:        Option<String>,
  pub occupation:       Option<String>,
  pub personality_tags: String,
  pub profile_photo_id: Option<String>,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawPerson {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      person_id:        row.get(0)?,
      first_name:       row.get(1)?,
      middle_name:      row.get(2)?,
      last_name:        row.get(3)?,
      preferred_name:   row.get(4)?,
      maiden_name:      row.get(5)?,
      gender:           row.get(6)?,
      birth_date:       row.get(7)?,
      birth_place:      row.get(8)?,
      death_date:       row.get(9)?,
      death_place:      row.get(10)?,
      is_living:        row.get(11)?,
      biography:        row.get(12)?,
      occupation:       row.get(13)?,
      personality_tags: row.get(14)?,
      profile_photo_id: row.get(15)?,
      created_at:       row.get(16)?,
      updated_at:       row.get(17)?,
    })
  }

  pub fn from_person(p: &Person) -> Result<Self> {
    Ok(Self {
      person_id:        p.id.to_string(),
      first_name:       p.first_name.clone(),
      middle_name:      p.middle_name.clone(),
      last_name:        p.last_name.clone(),
      preferred_name:   p.preferred_name.clone(),
      maiden_name:      p.maiden_name.clone(),
      gender:           p.gender.clone(),
      birth_date:       p.birth_date.map(encode_date),
      birth_place:      p.birth_place.clone(),
      death_date:       p.death_date.map(encode_date),
      death_place:      p.death_place.clone(),
      is_living:        p.is_living,
      biography:        p.biography.clone(),
      occupation:       p.occupation.clone(),
      personality_tags: encode_tags(&p.personality_tags)?,
      profile_photo_id: p.profile_photo_id.map(encode_uuid),
      created_at:       encode_dt(p.created_at),
      updated_at:       encode_dt(p.updated_at),
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:               PersonId::new(self.person_id),
      first_name:       self.first_name,
      middle_name:      self.middle_name,
      last_name:        self.last_name,
      preferred_name:   self.preferred_name,
      maiden_name:      self.maiden_name,
      gender:           self.gender,
      birth_date:       self.birth_date.as_deref().map(decode_date).transpose()?,
      birth_place:      self.birth_place,
      death_date:       self.death_date.as_deref().map(decode_date).transpose()?,
      death_place:      self.death_place,
      is_living:        self.is_living,
      biography:        self.biography,
      occupation:       self.occupation,
      personality_tags: decode_tags(&self.personality_tags)?,
      profile_photo_id: self
        .profile_photo_id
        .as_deref()
        .map(decode_uuid)
        .transpose()?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

pub const RELATIONSHIP_COLUMNS: &str =
  "relationship_id, from_id, to_id, kind, created_at";

/// Raw strings read directly from a `relationships` row.
pub struct RawRelationship {
  pub relationship_id: String,
  pub from_id:         String,
  pub to_id:           String,
  pub kind:            String,
  pub created_at:      String,
}

impl RawRelationship {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      relationship_id: row.get(0)?,
      from_id:         row.get(1)?,
      to_id:           row.get(2)?,
      kind:            row.get(3)?,
      created_at:      row.get(4)?,
    })
  }

  /// Fails on kinds outside [`RelationshipKind`]; the bulk read keeps those
  /// rows as native strings instead.
  pub fn into_relationship(self) -> Result<Relationship> {
    Ok(Relationship {
      relationship_id: decode_uuid(&self.relationship_id)?,
      from_id:         PersonId::new(self.from_id),
      to_id:           PersonId::new(self.to_id),
      kind:            self.kind.parse::<RelationshipKind>()?,
      created_at:      decode_dt(&self.created_at)?,
    })
  }
}

/// Column list matching [`RawMedia::from_row`]; expects `media` aliased `m`.
pub const MEDIA_COLUMNS: &str = "
  m.media_id, m.person_id, m.kind, m.file_name, m.original_file_name,
  m.file_path, m.media_type, m.file_size, m.content_hash, m.title, m.caption,
  m.is_featured, m.created_at";

/// Raw values read directly from a `media` row.
pub struct RawMedia {
  pub media_id:           String,
  pub person_id:          Option<String>,
  pub kind:               String,
  pub file_name:          String,
  pub original_file_name: String,
  pub file_path:          String,
  pub media_type:         String,
  pub file_size:          i64,
  pub content_hash:       String,
  pub title:              Option<String>,
  pub caption:            Option<String>,
  pub is_featured:        bool,
  pub created_at:         String,
}

impl RawMedia {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      media_id:           row.get(0)?,
      person_id:          row.get(1)?,
      kind:               row.get(2)?,
      file_name:          row.get(3)?,
      original_file_name: row.get(4)?,
      file_path:          row.get(5)?,
      media_type:         row.get(6)?,
      file_size:          row.get(7)?,
      content_hash:       row.get(8)?,
      title:              row.get(9)?,
      caption:            row.get(10)?,
      is_featured:        row.get(11)?,
      created_at:         row.get(12)?,
    })
  }

  pub fn into_media(self) -> Result<Media> {
    let file_size = u64::try_from(self.file_size)
      .map_err(|_| Error::InvalidColumn(format!("negative file size: {}", self.file_size)))?;
    Ok(Media {
      media_id: decode_uuid(&self.media_id)?,
      person_id: self.person_id.map(PersonId::new),
      kind: decode_media_kind(&self.kind)?,
      file_name: self.file_name,
      original_file_name: self.original_file_name,
      file_path: self.file_path,
      media_type: self.media_type,
      file_size,
      content_hash: self.content_hash,
      title: self.title,
      caption: self.caption,
      is_featured: self.is_featured,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}
