//! Post table port.

use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::post::{Post, PostId};
use shutterfeed_types::user::UserId;

/// Repository trait for post rows.
pub trait PostRepository: Send + Sync {
    /// All posts, newest first.
    fn list_posts(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, RepositoryError>> + Send;

    /// Posts by one user, newest first.
    fn list_by_user(
        &self,
        user_id: &UserId,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, RepositoryError>> + Send;

    fn get_post(
        &self,
        id: &PostId,
    ) -> impl std::future::Future<Output = Result<Option<Post>, RepositoryError>> + Send;

    fn create_post(
        &self,
        post: &Post,
    ) -> impl std::future::Future<Output = Result<Post, RepositoryError>> + Send;

    /// Delete a post. Fails with `NotFound` if it does not exist.
    fn delete_post(
        &self,
        id: &PostId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
