//! Media records: uploaded photos linked to people.
//!
//! No binary data lives in the record store; a record points at a file
//! under the configured upload directory.

use std::future::Future;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::PersonId;

/// Where an upload is filed. Each kind has its own sub-directory and size
/// limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
  Profile,
  Gallery,
}

impl MediaKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Profile => "profile",
      Self::Gallery => "gallery",
    }
  }
}

/// A stored media record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
  pub media_id:           Uuid,
  pub person_id:          Option<PersonId>,
  pub kind:               MediaKind,
  /// Generated on-disk file name, e.g. `profile_<uuid>.jpg`.
  pub file_name:          String,
  pub original_file_name: String,
  /// Path relative to the upload directory.
  pub file_path:          String,
  pub media_type:         String,
  pub file_size:          u64,
  /// SHA-256 hex digest of the file contents.
  pub content_hash:       String,
  pub title:              Option<String>,
  pub caption:            Option<String>,
  pub is_featured:        bool,
  pub created_at:         DateTime<Utc>,
}

/// Input to [`MediaStore::add_media`].
#[derive(Debug, Clone)]
pub struct NewMedia {
  pub person_id:          Option<PersonId>,
  pub kind:               MediaKind,
  pub file_name:          String,
  pub original_file_name: String,
  pub file_path:          String,
  pub media_type:         String,
  pub file_size:          u64,
  pub content_hash:       String,
  pub title:              Option<String>,
  pub caption:            Option<String>,
  pub is_featured:        bool,
}

/// Metadata edits accepted by [`MediaStore::update_media`]. `None` leaves a
/// field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpdate {
  pub title:       Option<String>,
  pub caption:     Option<String>,
  pub is_featured: Option<bool>,
}

/// Abstraction over the media-record backend.
pub trait MediaStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn add_media(
    &self,
    input: NewMedia,
  ) -> impl Future<Output = Result<Media, Self::Error>> + Send + '_;

  fn get_media(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Media>, Self::Error>> + Send + '_;

  /// All media linked to a person, featured first, then newest first.
  fn list_media_for_person(
    &self,
    person_id: PersonId,
    featured_only: bool,
  ) -> impl Future<Output = Result<Vec<Media>, Self::Error>> + Send + '_;

  /// Returns `None` if the record does not exist.
  fn update_media(
    &self,
    id: Uuid,
    update: MediaUpdate,
  ) -> impl Future<Output = Result<Option<Media>, Self::Error>> + Send + '_;

  /// Remove a record and return it. Any profile photo pointing at it is
  /// cleared. Removing the file itself is the caller's job.
  fn delete_media(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Media>, Self::Error>> + Send + '_;

  /// Point a person's profile photo at `media_id` (or clear it). Returns
  /// `false` if the person does not exist.
  fn set_profile_photo(
    &self,
    person_id: PersonId,
    media_id: Option<Uuid>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// The person's explicit profile photo, or failing that their newest
  /// featured image.
  fn profile_photo(
    &self,
    person_id: PersonId,
  ) -> impl Future<Output = Result<Option<Media>, Self::Error>> + Send + '_;
}
