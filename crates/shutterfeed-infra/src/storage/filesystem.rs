//! Filesystem-backed object store.
//!
//! Objects live at `{root}/{bucket}/{path}` and their public URL is a
//! `file://` URL to that location.
//!
//! ```text
//! {data_dir}/storage/
//!   post-media/
//!     {user_id}/1700000000000.jpg
//!     {user_id}/avatar_1700000000123.png
//! ```

use std::path::{Component, Path, PathBuf};

use shutterfeed_core::repository::MediaStore;
use shutterfeed_types::error::RepositoryError;

pub struct LocalMediaStore {
    root: PathBuf,
}

impl LocalMediaStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve an object location, rejecting paths that would escape the
    /// bucket directory.
    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, RepositoryError> {
        let relative = Path::new(path);
        let safe = !path.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe || bucket.is_empty() || bucket.contains(['/', '\\']) {
            return Err(RepositoryError::Query(format!(
                "invalid object path '{bucket}/{path}'"
            )));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

impl MediaStore for LocalMediaStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, RepositoryError> {
        let target = self.object_path(bucket, path)?;
        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            return Err(RepositoryError::Conflict(format!("object '{bucket}/{path}' exists")));
        }
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }
        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        tracing::debug!(bucket, path, content_type, size = bytes.len(), "stored object");
        Ok(self.public_url(bucket, path))
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> Result<(), RepositoryError> {
        for path in paths {
            let target = self.object_path(bucket, path)?;
            match tokio::fs::remove_file(&target).await {
                Ok(()) => tracing::debug!(bucket, path = %path, "removed object"),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(RepositoryError::Query(e.to_string())),
            }
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("file://{}/{bucket}/{path}", self.root.display())
    }
}
