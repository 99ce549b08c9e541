//! Handlers for uploads and media records.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/upload/profile/{person_id}` | Multipart; becomes the profile photo |
//! | `POST`   | `/upload/gallery/{person_id}` | Multipart; optional `featured` part |
//! | `GET`    | `/media/member/{person_id}` | `?featured=true` to restrict |
//! | `GET`    | `/media/member/{person_id}/profile-photo` | 404 if none |
//! | `GET`    | `/media/{id}` | |
//! | `PUT`    | `/media/{id}` | Body: [`MediaUpdate`] |
//! | `DELETE` | `/media/{id}` | Removes the record and the file |

use axum::{
  Json,
  extract::{Multipart, Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use kin_core::{
  media::{Media, MediaKind, MediaStore, MediaUpdate, NewMedia},
  person::PersonId,
  store::FamilyStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  MediaState,
  error::{MediaError, Result},
  upload::{self, content_hash, read_upload, store_file},
};

async fn require_person<S>(store: &S, id: &PersonId) -> Result<()>
where
  S: FamilyStore,
{
  let exists = store
    .get_person(id.clone())
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?
    .is_some();
  if exists {
    Ok(())
  } else {
    Err(MediaError::NotFound(format!("person {id} not found")))
  }
}

// ─── Upload ──────────────────────────────────────────────────────────────────

async fn accept<S>(
  state: &MediaState<S>,
  person_id: PersonId,
  kind: MediaKind,
  multipart: Multipart,
) -> Result<Media>
where
  S: FamilyStore + MediaStore + 'static,
{
  require_person(state.store.as_ref(), &person_id).await?;

  let upload = read_upload(multipart, upload::max_bytes(kind)).await?;
  let stored = store_file(&state.config.upload_dir, kind, &upload).await?;

  let input = NewMedia {
    person_id: Some(person_id.clone()),
    kind,
    file_name: stored.file_name,
    original_file_name: upload.original_file_name,
    file_path: stored.relative_path.clone(),
    media_type: upload.content_type,
    file_size: upload.data.len() as u64,
    content_hash: content_hash(&upload.data),
    title: upload.title,
    caption: upload.caption,
    is_featured: kind == MediaKind::Gallery && upload.featured,
  };

  let media = match state.store.add_media(input).await {
    Ok(m) => m,
    Err(e) => {
      // Do not leave an orphaned file behind.
      if let Err(io) = upload::remove_file(&state.config.upload_dir, &stored.relative_path).await {
        tracing::warn!(path = %stored.relative_path, error = %io, "failed to remove orphaned upload");
      }
      return Err(MediaError::Store(Box::new(e)));
    }
  };

  tracing::info!(
    person = %person_id,
    media = %media.media_id,
    kind = kind.as_str(),
    bytes = media.file_size,
    path = %media.file_path,
    "stored upload"
  );
  Ok(media)
}

/// `POST /upload/profile/{person_id}`
pub async fn upload_profile<S>(
  State(state): State<MediaState<S>>,
  Path(person_id): Path<PersonId>,
  multipart: Multipart,
) -> Result<impl IntoResponse>
where
  S: FamilyStore + MediaStore + 'static,
{
  let media = accept(&state, person_id.clone(), MediaKind::Profile, multipart).await?;
  state
    .store
    .set_profile_photo(person_id, Some(media.media_id))
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?;
  Ok((StatusCode::CREATED, Json(media)))
}

/// `POST /upload/gallery/{person_id}`
pub async fn upload_gallery<S>(
  State(state): State<MediaState<S>>,
  Path(person_id): Path<PersonId>,
  multipart: Multipart,
) -> Result<impl IntoResponse>
where
  S: FamilyStore + MediaStore + 'static,
{
  let media = accept(&state, person_id, MediaKind::Gallery, multipart).await?;
  Ok((StatusCode::CREATED, Json(media)))
}

// ─── Per-person reads ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub featured: bool,
}

/// `GET /media/member/{person_id}[?featured=true]`
pub async fn list_for_person<S>(
  State(state): State<MediaState<S>>,
  Path(person_id): Path<PersonId>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Media>>>
where
  S: FamilyStore + MediaStore + 'static,
{
  require_person(state.store.as_ref(), &person_id).await?;
  let media = state
    .store
    .list_media_for_person(person_id, params.featured)
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?;
  Ok(Json(media))
}

/// `GET /media/member/{person_id}/profile-photo`
pub async fn profile_photo<S>(
  State(state): State<MediaState<S>>,
  Path(person_id): Path<PersonId>,
) -> Result<Json<Media>>
where
  S: FamilyStore + MediaStore + 'static,
{
  require_person(state.store.as_ref(), &person_id).await?;
  let media = state
    .store
    .profile_photo(person_id.clone())
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?
    .ok_or_else(|| MediaError::NotFound(format!("person {person_id} has no profile photo")))?;
  Ok(Json(media))
}

// ─── Single record ───────────────────────────────────────────────────────────

/// `GET /media/{id}`
pub async fn get_one<S>(
  State(state): State<MediaState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Media>>
where
  S: FamilyStore + MediaStore + 'static,
{
  let media = state
    .store
    .get_media(id)
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?
    .ok_or_else(|| MediaError::NotFound(format!("media {id} not found")))?;
  Ok(Json(media))
}

/// `PUT /media/{id}`
pub async fn update<S>(
  State(state): State<MediaState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<MediaUpdate>,
) -> Result<Json<Media>>
where
  S: FamilyStore + MediaStore + 'static,
{
  let media = state
    .store
    .update_media(id, body)
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?
    .ok_or_else(|| MediaError::NotFound(format!("media {id} not found")))?;
  Ok(Json(media))
}

/// `DELETE /media/{id}`
pub async fn delete_one<S>(
  State(state): State<MediaState<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode>
where
  S: FamilyStore + MediaStore + 'static,
{
  let media = state
    .store
    .delete_media(id)
    .await
    .map_err(|e| MediaError::Store(Box::new(e)))?
    .ok_or_else(|| MediaError::NotFound(format!("media {id} not found")))?;

  // The record is gone either way; a file that cannot be removed is only
  // logged.
  match upload::remove_file(&state.config.upload_dir, &media.file_path).await {
    Ok(()) => tracing::info!(media = %id, path = %media.file_path, "deleted media"),
    Err(e) => tracing::warn!(media = %id, path = %media.file_path, error = %e, "failed to remove media file"),
  }
  Ok(StatusCode::NO_CONTENT)
}
