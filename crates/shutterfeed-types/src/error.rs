use thiserror::Error;

/// Errors from authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("an account with this email already exists")]
    DuplicateAccount,

    #[error("invalid email address: '{0}'")]
    InvalidEmail(String),

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("auth backend error: {0}")]
    Backend(String),
}

/// Errors related to profile bootstrap and setup.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// Lookup or insert against the profile store failed.
    #[error("profile backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("username '{0}' is already taken")]
    UsernameTaken(String),

    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error("bio must be at most {max} characters")]
    BioTooLong { max: usize },

    #[error("profile not found")]
    NotFound,

    #[error("profile update failed: {0}")]
    Backend(String),
}

/// Errors from media validation and object storage.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("unsupported media type '{0}'")]
    UnsupportedType(String),

    #[error("file is {size} bytes, limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("storage error: {0}")]
    Storage(String),
}

/// Errors related to post operations.
#[derive(Debug, Error)]
pub enum PostError {
    #[error("post content cannot be empty")]
    EmptyContent,

    #[error("post not found")]
    NotFound,

    #[error("only the author can delete this post")]
    NotOwner,

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error("post backend error: {0}")]
    Backend(String),
}

/// Errors returned by orchestrator operations.
#[derive(Debug, Error)]
pub enum ViewError {
    #[error("not signed in")]
    NotAuthenticated,

    #[error("profile setup is not complete")]
    SetupIncomplete,

    #[error("profile setup is already complete")]
    SetupAlreadyComplete,

    #[error("profile is still loading")]
    ProfileLoading,

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Post(#[from] PostError),
}

/// Errors from repository operations (used by port traits in shutterfeed-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("backend connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_error_display() {
        let err = ProfileError::UsernameTaken("alice".to_string());
        assert_eq!(err.to_string(), "username 'alice' is already taken");
    }

    #[test]
    fn test_view_error_wraps_transparently() {
        let err: ViewError = ProfileError::UsernameTaken("alice".to_string()).into();
        assert_eq!(err.to_string(), "username 'alice' is already taken");
        assert!(matches!(err, ViewError::Profile(ProfileError::UsernameTaken(_))));
    }

    #[test]
    fn test_media_error_display() {
        let err = MediaError::TooLarge { size: 10, max: 5 };
        assert!(err.to_string().contains("10"));
        assert!(err.to_string().contains("5"));
    }

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }
}
