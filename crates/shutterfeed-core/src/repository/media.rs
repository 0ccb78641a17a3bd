//! Object storage port.

use shutterfeed_types::error::RepositoryError;

/// Bucketed object storage with public URLs.
pub trait MediaStore: Send + Sync {
    /// Store `bytes` at `path` in `bucket` and return the object's public URL.
    ///
    /// Fails with `Conflict` if an object already exists at that path.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<String, RepositoryError>> + Send;

    /// Remove objects. Paths that do not exist are ignored.
    fn remove(
        &self,
        bucket: &str,
        paths: &[String],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Public URL for an object path.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}
