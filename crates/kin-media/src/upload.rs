//! Reading image uploads out of a multipart body and filing them on disk.
//!
//! Files are named `<prefix>_<uuid>.<ext>` and placed in one sub-directory
//! per [`MediaKind`] under the upload root. The path recorded in the store is
//! relative to that root and always uses `/`.

use std::path::Path;

use axum::{body::Bytes, extract::Multipart};
use kin_core::media::MediaKind;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::{MediaError, Result};

pub const PROFILE_MAX_BYTES: usize = 5 * 1024 * 1024;
pub const GALLERY_MAX_BYTES: usize = 10 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpeg", "jpg", "png", "gif", "webp"];
const IMAGE_TYPES: &[&str] = &[
  "image/jpeg",
  "image/jpg",
  "image/png",
  "image/gif",
  "image/webp",
];

pub fn max_bytes(kind: MediaKind) -> usize {
  match kind {
    MediaKind::Profile => PROFILE_MAX_BYTES,
    MediaKind::Gallery => GALLERY_MAX_BYTES,
  }
}

pub fn kind_dir(kind: MediaKind) -> &'static str {
  match kind {
    MediaKind::Profile => "profile-photos",
    MediaKind::Gallery => "galleries",
  }
}

/// One validated upload, still in memory.
#[derive(Debug)]
pub struct Upload {
  pub original_file_name: String,
  pub content_type:       String,
  /// Lowercased extension taken from the original file name.
  pub extension:          String,
  pub data:               Bytes,
  pub title:              Option<String>,
  pub caption:            Option<String>,
  pub featured:           bool,
}

/// Drain `multipart`, keeping the `file` part and the optional `title`,
/// `caption` and `featured` text parts. Unknown parts are skipped.
pub async fn read_upload(mut multipart: Multipart, max: usize) -> Result<Upload> {
  let mut file: Option<(String, String, Bytes)> = None;
  let mut title = None;
  let mut caption = None;
  let mut featured = false;

  while let Some(field) = multipart.next_field().await? {
    let name = field.name().unwrap_or_default().to_owned();
    match name.as_str() {
      "file" => {
        let file_name = field.file_name().unwrap_or_default().to_owned();
        let content_type = field.content_type().unwrap_or_default().to_owned();
        let data = field.bytes().await?;
        file = Some((file_name, content_type, data));
      }
      "title" => title = non_empty(field.text().await?),
      "caption" => caption = non_empty(field.text().await?),
      "featured" => {
        featured = matches!(field.text().await?.trim(), "true" | "1" | "on");
      }
      _ => {}
    }
  }

  let (original_file_name, content_type, data) =
    file.ok_or_else(|| MediaError::InvalidUpload("no file uploaded".into()))?;

  let extension = image_extension(&original_file_name)
    .filter(|_| is_image_type(&content_type))
    .ok_or_else(|| {
      MediaError::InvalidUpload(
        "only image files (JPEG, JPG, PNG, GIF, WEBP) are allowed".into(),
      )
    })?;

  if data.is_empty() {
    return Err(MediaError::InvalidUpload("uploaded file is empty".into()));
  }
  if data.len() > max {
    return Err(MediaError::InvalidUpload(format!(
      "file is {} bytes; the limit is {max}",
      data.len()
    )));
  }

  Ok(Upload {
    original_file_name,
    content_type,
    extension,
    data,
    title,
    caption,
    featured,
  })
}

fn non_empty(s: String) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn image_extension(file_name: &str) -> Option<String> {
  let ext = Path::new(file_name).extension()?.to_str()?.to_ascii_lowercase();
  IMAGE_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

fn is_image_type(content_type: &str) -> bool {
  let essence = content_type.split(';').next().unwrap_or_default().trim();
  IMAGE_TYPES.iter().any(|t| t.eq_ignore_ascii_case(essence))
}

/// Lowercase hex SHA-256 of `data`.
pub fn content_hash(data: &[u8]) -> String {
  hex::encode(Sha256::digest(data))
}

/// Where a stored file ended up: its generated name and its path relative to
/// the upload root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
  pub file_name:     String,
  pub relative_path: String,
}

/// Write `upload` under `root`, creating the kind's directory if needed.
pub async fn store_file(
  root: &Path,
  kind: MediaKind,
  upload: &Upload,
) -> Result<StoredFile> {
  let dir = kind_dir(kind);
  let file_name = format!("{}_{}.{}", kind.as_str(), Uuid::new_v4(), upload.extension);

  tokio::fs::create_dir_all(root.join(dir)).await?;
  tokio::fs::write(root.join(dir).join(&file_name), &upload.data).await?;

  Ok(StoredFile { relative_path: format!("{dir}/{file_name}"), file_name })
}

/// Remove a stored file. A file that is already gone is not an error.
pub async fn remove_file(root: &Path, relative_path: &str) -> std::io::Result<()> {
  match tokio::fs::remove_file(root.join(relative_path)).await {
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
      tracing::warn!(path = relative_path, "media file already missing");
      Ok(())
    }
    other => other,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extension_and_type_must_both_be_images() {
    assert_eq!(image_extension("Holiday.JPG").as_deref(), Some("jpg"));
    assert_eq!(image_extension("scan.webp").as_deref(), Some("webp"));
    assert!(image_extension("notes.pdf").is_none());
    assert!(image_extension("no-extension").is_none());

    assert!(is_image_type("image/png"));
    assert!(is_image_type("IMAGE/JPEG; charset=binary"));
    assert!(!is_image_type("application/pdf"));
    assert!(!is_image_type(""));
  }

  #[test]
  fn content_hash_is_sha256_hex() {
    assert_eq!(
      content_hash(b"abc"),
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn limits_differ_per_kind() {
    assert_eq!(max_bytes(MediaKind::Profile), 5 * 1024 * 1024);
    assert_eq!(max_bytes(MediaKind::Gallery), 10 * 1024 * 1024);
    assert_eq!(kind_dir(MediaKind::Profile), "profile-photos");
  }

  #[tokio::test]
  async fn store_then_remove_file() {
    let root = tempfile::tempdir().unwrap();
    let upload = Upload {
      original_file_name: "a.png".into(),
      content_type:       "image/png".into(),
      extension:          "png".into(),
      data:               Bytes::from_static(b"\x89PNG"),
      title:              None,
      caption:            None,
      featured:           false,
    };

    let stored = store_file(root.path(), MediaKind::Gallery, &upload).await.unwrap();
    assert!(stored.file_name.starts_with("gallery_"));
    assert!(stored.file_name.ends_with(".png"));
    assert_eq!(stored.relative_path, format!("galleries/{}", stored.file_name));

    let on_disk = tokio::fs::read(root.path().join(&stored.relative_path)).await.unwrap();
    assert_eq!(on_disk, b"\x89PNG");

    remove_file(root.path(), &stored.relative_path).await.unwrap();
    assert!(!root.path().join(&stored.relative_path).exists());
    // Second removal is a no-op.
    remove_file(root.path(), &stored.relative_path).await.unwrap();
  }
}
