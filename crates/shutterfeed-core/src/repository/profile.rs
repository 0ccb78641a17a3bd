//! Profile table port.

use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::profile::{Profile, ProfileUpdate};
use shutterfeed_types::user::UserId;

/// Repository trait for profile rows.
pub trait ProfileRepository: Send + Sync {
    /// Get the profile for a user id.
    fn get_profile(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Get the profiles for a set of user ids. Missing ids are skipped.
    fn get_profiles(
        &self,
        ids: &[UserId],
    ) -> impl std::future::Future<Output = Result<Vec<Profile>, RepositoryError>> + Send;

    /// Insert a new profile. Fails with `Conflict` if the id or username exists.
    fn create_profile(
        &self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<Profile, RepositoryError>> + Send;

    /// Apply a partial update and return the stored result.
    ///
    /// Fails with `NotFound` for unknown ids and `Conflict` on a username clash.
    fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> impl std::future::Future<Output = Result<Profile, RepositoryError>> + Send;

    /// Whether `username` belongs to any profile other than `excluding`.
    fn is_username_taken(
        &self,
        username: &str,
        excluding: &UserId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
