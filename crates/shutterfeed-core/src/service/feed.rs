//! Feed listing and post lifecycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use shutterfeed_types::error::{PostError, RepositoryError};
use shutterfeed_types::post::{CreatePostRequest, FeedPost, Post, PostId};
use shutterfeed_types::profile::{AuthorSummary, Profile, ProfileStats};
use shutterfeed_types::user::UserId;

use crate::repository::{Backend, PostRepository, ProfileRepository};
use crate::service::media::MediaService;

/// A user's own posts, newest first, with counters.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileDetail {
    pub profile: Profile,
    pub posts: Vec<Post>,
    pub stats: ProfileStats,
}

pub struct FeedService<B: Backend> {
    backend: Arc<B>,
    media: MediaService<B>,
}

impl<B: Backend> Clone for FeedService<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            media: self.media.clone(),
        }
    }
}

impl<B: Backend> FeedService<B> {
    pub fn new(backend: Arc<B>, media: MediaService<B>) -> Self {
        Self { backend, media }
    }

    /// All posts, newest first, each joined with its author's summary.
    pub async fn fetch_feed(&self) -> Result<Vec<FeedPost>, PostError> {
        let posts = self.backend.posts().list_posts().await.map_err(backend_error)?;

        let mut seen = HashSet::new();
        let author_ids: Vec<UserId> = posts
            .iter()
            .map(|p| p.user_id)
            .filter(|id| seen.insert(*id))
            .collect();
        let authors: HashMap<UserId, AuthorSummary> = self
            .backend
            .profiles()
            .get_profiles(&author_ids)
            .await
            .map_err(backend_error)?
            .iter()
            .map(|p| (p.id, AuthorSummary::from(p)))
            .collect();

        tracing::debug!(posts = posts.len(), authors = authors.len(), "fetched feed");
        Ok(posts
            .into_iter()
            .map(|post| {
                let author = authors.get(&post.user_id).cloned();
                FeedPost { post, author }
            })
            .collect())
    }

    /// Profile detail page content for `profile`.
    pub async fn profile_detail(&self, profile: Profile) -> Result<ProfileDetail, PostError> {
        let posts = self
            .backend
            .posts()
            .list_by_user(&profile.id)
            .await
            .map_err(backend_error)?;
        let stats = ProfileStats {
            posts: posts.len(),
            ..Default::default()
        };
        Ok(ProfileDetail {
            profile,
            posts,
            stats,
        })
    }

    pub async fn create_post(
        &self,
        user_id: &UserId,
        request: CreatePostRequest,
    ) -> Result<Post, PostError> {
        let content = request.content.trim();
        if content.is_empty() {
            return Err(PostError::EmptyContent);
        }

        let (media_url, media_type) = match &request.media {
            Some(upload) => {
                let (url, kind) = self.media.upload_post_media(user_id, upload).await?;
                (Some(url), Some(kind))
            }
            None => (None, None),
        };

        let post = Post {
            id: PostId::new(),
            user_id: *user_id,
            content: content.to_string(),
            media_url,
            media_type,
            created_at: chrono::Utc::now(),
        };
        let post = self
            .backend
            .posts()
            .create_post(&post)
            .await
            .map_err(backend_error)?;
        tracing::info!(post_id = %post.id, %user_id, "post created");
        Ok(post)
    }

    /// Delete one of `user_id`'s posts, removing its media object first.
    pub async fn delete_post(&self, user_id: &UserId, post_id: &PostId) -> Result<(), PostError> {
        let post = self
            .backend
            .posts()
            .get_post(post_id)
            .await
            .map_err(backend_error)?
            .ok_or(PostError::NotFound)?;
        if post.user_id != *user_id {
            return Err(PostError::NotOwner);
        }

        if let Some(url) = post.media_url.as_deref() {
            if let Err(e) = self.media.remove_post_media(user_id, url).await {
                tracing::warn!(%post_id, error = %e, "failed to remove post media");
            }
        }

        self.backend
            .posts()
            .delete_post(post_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => PostError::NotFound,
                other => backend_error(other),
            })?;
        tracing::info!(%post_id, "post deleted");
        Ok(())
    }
}

fn backend_error(err: RepositoryError) -> PostError {
    PostError::Backend(err.to_string())
}
