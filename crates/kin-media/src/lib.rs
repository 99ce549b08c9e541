//! Photo uploads for Kin.
//!
//! Accepts multipart image uploads, writes them under a configured upload
//! directory and records them through [`kin_core::media::MediaStore`]. The
//! files themselves are served by whoever mounts this router (see
//! `kin-server`, which uses `tower_http::services::ServeDir`).

pub mod error;
pub mod media;
pub mod upload;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  routing::{get, post},
};
use kin_core::{media::MediaStore, store::FamilyStore};

pub use error::MediaError;

/// Room for the multipart framing and text parts above the largest file.
const BODY_SLACK_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct MediaConfig {
  /// Root directory; per-kind sub-directories are created on demand.
  pub upload_dir: PathBuf,
}

pub struct MediaState<S> {
  pub store:  Arc<S>,
  pub config: Arc<MediaConfig>,
}

impl<S> Clone for MediaState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), config: Arc::clone(&self.config) }
  }
}

/// Build the media router for `store`.
pub fn media_router<S>(store: Arc<S>, config: MediaConfig) -> Router<()>
where
  S: FamilyStore + MediaStore + 'static,
{
  Router::new()
    .route("/upload/profile/{person_id}", post(media::upload_profile::<S>))
    .route("/upload/gallery/{person_id}", post(media::upload_gallery::<S>))
    .route("/media/member/{person_id}", get(media::list_for_person::<S>))
    .route(
      "/media/member/{person_id}/profile-photo",
      get(media::profile_photo::<S>),
    )
    .route(
      "/media/{id}",
      get(media::get_one::<S>)
        .put(media::update::<S>)
        .delete(media::delete_one::<S>),
    )
    .layer(DefaultBodyLimit::max(upload::GALLERY_MAX_BYTES + BODY_SLACK_BYTES))
    .with_state(MediaState { store, config: Arc::new(config) })
}
