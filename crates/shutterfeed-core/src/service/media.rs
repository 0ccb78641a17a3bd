//! Media upload rules and object-path conventions.
//!
//! Post media lives at `{user_id}/{unix_millis}.{ext}` and avatars at
//! `{user_id}/avatar_{unix_millis}.{ext}` inside the configured bucket.

use std::sync::Arc;

use shutterfeed_types::error::{MediaError, RepositoryError};
use shutterfeed_types::post::{MediaType, MediaUpload};
use shutterfeed_types::user::UserId;

use crate::repository::{Backend, MediaStore};

/// Object path for post media.
pub fn post_media_path(user_id: &UserId, unix_millis: i64, ext: &str) -> String {
    format!("{user_id}/{unix_millis}.{ext}")
}

/// Object path for an avatar.
pub fn avatar_path(user_id: &UserId, unix_millis: i64, ext: &str) -> String {
    format!("{user_id}/avatar_{unix_millis}.{ext}")
}

/// Recover the object path from a public URL in `bucket`.
///
/// Returns `None` for URLs that do not point into the bucket, such as
/// generated default avatars.
///
/// ```
/// use shutterfeed_core::service::media::object_path_from_url;
///
/// let url = "https://x.example/storage/v1/object/public/post-media/u1/1.png";
/// assert_eq!(object_path_from_url(url, "post-media").as_deref(), Some("u1/1.png"));
/// assert_eq!(object_path_from_url("https://avatars.example/svg?seed=u1", "post-media"), None);
/// ```
pub fn object_path_from_url(url: &str, bucket: &str) -> Option<String> {
    let marker = format!("/{bucket}/");
    url.split_once(&marker)
        .map(|(_, path)| path.to_string())
        .filter(|path| !path.is_empty())
}

/// Post attachments must be images or videos.
pub fn validate_post_media(upload: &MediaUpload) -> Result<MediaType, MediaError> {
    let ct = upload.content_type.as_str();
    if ct.starts_with("image/") || ct.starts_with("video/") {
        Ok(MediaType::from_content_type(ct))
    } else {
        Err(MediaError::UnsupportedType(upload.content_type.clone()))
    }
}

/// Avatars must be images no larger than `max_bytes`.
pub fn validate_avatar(upload: &MediaUpload, max_bytes: usize) -> Result<(), MediaError> {
    if !upload.content_type.starts_with("image/") {
        return Err(MediaError::UnsupportedType(upload.content_type.clone()));
    }
    if upload.size() > max_bytes {
        return Err(MediaError::TooLarge {
            size: upload.size(),
            max: max_bytes,
        });
    }
    Ok(())
}

/// Uploads and removes media objects in one bucket.
pub struct MediaService<B: Backend> {
    backend: Arc<B>,
    bucket: String,
    max_avatar_bytes: usize,
}

impl<B: Backend> Clone for MediaService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            bucket: self.bucket.clone(),
            max_avatar_bytes: self.max_avatar_bytes,
        }
    }
}

impl<B: Backend> MediaService<B> {
    pub fn new(backend: Arc<B>, bucket: impl Into<String>, max_avatar_bytes: usize) -> Self {
        Self {
            backend,
            bucket: bucket.into(),
            max_avatar_bytes,
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Validate and upload a post attachment. Returns its public URL and kind.
    pub async fn upload_post_media(
        &self,
        user_id: &UserId,
        upload: &MediaUpload,
    ) -> Result<(String, MediaType), MediaError> {
        let media_type = validate_post_media(upload)?;
        let path = post_media_path(user_id, now_millis(), upload.extension());
        let url = self.put(&path, upload).await?;
        Ok((url, media_type))
    }

    /// Validate and upload an avatar. Returns its public URL.
    pub async fn upload_avatar(
        &self,
        user_id: &UserId,
        upload: &MediaUpload,
    ) -> Result<String, MediaError> {
        validate_avatar(upload, self.max_avatar_bytes)?;
        let path = avatar_path(user_id, now_millis(), upload.extension());
        self.put(&path, upload).await
    }

    /// Remove the post media object behind `url` if `owner` uploaded it.
    ///
    /// Returns `Ok(false)` when the URL points elsewhere or under another
    /// user's prefix.
    pub async fn remove_post_media(&self, owner: &UserId, url: &str) -> Result<bool, MediaError> {
        self.remove_under(&format!("{owner}/"), url).await
    }

    /// Remove an avatar object behind `url` if it is one of `owner`'s avatars.
    pub async fn remove_avatar(&self, owner: &UserId, url: &str) -> Result<bool, MediaError> {
        self.remove_under(&format!("{owner}/avatar_"), url).await
    }

    async fn remove_under(&self, prefix: &str, url: &str) -> Result<bool, MediaError> {
        let Some(path) = object_path_from_url(url, &self.bucket).filter(|p| p.starts_with(prefix))
        else {
            return Ok(false);
        };
        self.backend
            .media()
            .remove(&self.bucket, &[path])
            .await
            .map_err(storage_error)?;
        Ok(true)
    }

    async fn put(&self, path: &str, upload: &MediaUpload) -> Result<String, MediaError> {
        tracing::debug!(bucket = %self.bucket, path, size = upload.size(), "uploading media");
        self.backend
            .media()
            .upload(&self.bucket, path, &upload.bytes, &upload.content_type)
            .await
            .map_err(storage_error)
    }
}

fn storage_error(err: RepositoryError) -> MediaError {
    MediaError::Storage(err.to_string())
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryBackend;

    fn upload(name: &str, content_type: &str, size: usize) -> MediaUpload {
        MediaUpload {
            file_name: name.to_string(),
            content_type: content_type.to_string(),
            bytes: vec![0u8; size],
        }
    }

    #[test]
    fn test_paths() {
        let id: UserId = "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b".parse().unwrap();
        assert_eq!(
            post_media_path(&id, 1700000000000, "png"),
            "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b/1700000000000.png"
        );
        assert_eq!(
            avatar_path(&id, 42, "jpg"),
            "0f8e2a4b-1c3d-4e5f-8a9b-0c1d2e3f4a5b/avatar_42.jpg"
        );
    }

    #[test]
    fn test_object_path_from_url_requires_bucket_segment() {
        assert_eq!(
            object_path_from_url("file:///data/storage/post-media/u/a.png", "post-media")
                .as_deref(),
            Some("u/a.png")
        );
        assert_eq!(object_path_from_url("https://x/post-media/", "post-media"), None);
        assert_eq!(object_path_from_url("https://x/other/u/a.png", "post-media"), None);
    }

    #[test]
    fn test_validate_avatar() {
        assert!(validate_avatar(&upload("a.png", "image/png", 10), 100).is_ok());
        assert!(matches!(
            validate_avatar(&upload("a.mp4", "video/mp4", 10), 100),
            Err(MediaError::UnsupportedType(_))
        ));
        assert!(matches!(
            validate_avatar(&upload("a.png", "image/png", 101), 100),
            Err(MediaError::TooLarge { size: 101, max: 100 })
        ));
    }

    #[test]
    fn test_validate_post_media() {
        assert_eq!(
            validate_post_media(&upload("a.mp4", "video/mp4", 1)).unwrap(),
            MediaType::Video
        );
        assert!(validate_post_media(&upload("a.pdf", "application/pdf", 1)).is_err());
    }

    #[tokio::test]
    async fn test_remove_is_scoped_to_owner_prefix() {
        let backend = Arc::new(MemoryBackend::new());
        let media = MediaService::new(Arc::clone(&backend), "post-media", 1024);
        let owner = UserId::new();
        let stranger = UserId::new();

        let (post_url, _) = media
            .upload_post_media(&owner, &upload("a.png", "image/png", 4))
            .await
            .unwrap();
        let avatar_url = media
            .upload_avatar(&owner, &upload("me.png", "image/png", 4))
            .await
            .unwrap();

        assert!(!media.remove_post_media(&stranger, &post_url).await.unwrap());
        assert!(!media.remove_avatar(&stranger, &avatar_url).await.unwrap());
        assert!(!media.remove_avatar(&owner, &post_url).await.unwrap());
        assert_eq!(backend.media.count(), 2);

        assert!(media.remove_avatar(&owner, &avatar_url).await.unwrap());
        assert_eq!(backend.media.count(), 1);
    }

    #[tokio::test]
    async fn test_upload_and_remove_post_media() {
        let backend = Arc::new(MemoryBackend::new());
        let media = MediaService::new(Arc::clone(&backend), "post-media", 1024);
        let user = UserId::new();

        let (url, kind) = media
            .upload_post_media(&user, &upload("clip.mp4", "video/mp4", 8))
            .await
            .unwrap();
        assert_eq!(kind, MediaType::Video);
        assert_eq!(backend.media.count(), 1);

        assert!(media.remove_post_media(&user, &url).await.unwrap());
        assert_eq!(backend.media.count(), 0);

        assert!(!media
            .remove_post_media(&user, "https://avatars.test/svg?seed=x")
            .await
            .unwrap());
    }
}
