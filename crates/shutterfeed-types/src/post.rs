use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

use crate::profile::AuthorSummary;
use crate::user::UserId;

/// Unique identifier for a post, wrapping a UUID v7 (time-sortable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PostId(pub Uuid);

impl PostId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PostId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PostId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Kind of media attached to a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// `image/*` content types are images; everything else is treated as video.
    pub fn from_content_type(content_type: &str) -> Self {
        if content_type.starts_with("image/") {
            MediaType::Image
        } else {
            MediaType::Video
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Image => write!(f, "image"),
            MediaType::Video => write!(f, "video"),
        }
    }
}

impl FromStr for MediaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "image" => Ok(MediaType::Image),
            "video" => Ok(MediaType::Video),
            other => Err(format!("invalid media type: '{other}'")),
        }
    }
}

/// A post in the shared feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub media_url: Option<String>,
    pub media_type: Option<MediaType>,
    pub created_at: DateTime<Utc>,
}

/// A post joined with its author's profile summary.
///
/// `author` is `None` when the author has no profile row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<AuthorSummary>,
}

impl FeedPost {
    /// Author handle, `"user"` when unknown.
    pub fn author_name(&self) -> &str {
        self.author
            .as_ref()
            .map(|a| a.username.as_str())
            .unwrap_or("user")
    }
}

/// A file selected for upload (post media or avatar).
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl MediaUpload {
    /// Extension taken from the file name, without the dot.
    pub fn extension(&self) -> &str {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .unwrap_or("bin")
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Request to create a post. Media is optional.
#[derive(Debug, Clone)]
pub struct CreatePostRequest {
    pub content: String,
    pub media: Option<MediaUpload>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_from_content_type() {
        assert_eq!(MediaType::from_content_type("image/png"), MediaType::Image);
        assert_eq!(MediaType::from_content_type("video/mp4"), MediaType::Video);
        assert_eq!(
            MediaType::from_content_type("application/octet-stream"),
            MediaType::Video
        );
    }

    #[test]
    fn test_media_type_parse() {
        assert_eq!("IMAGE".parse::<MediaType>().unwrap(), MediaType::Image);
        assert!("gif".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_upload_extension() {
        let upload = MediaUpload {
            file_name: "holiday.photo.JPG".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: vec![1, 2, 3],
        };
        assert_eq!(upload.extension(), "JPG");
        assert_eq!(upload.size(), 3);

        let bare = MediaUpload {
            file_name: "noext".to_string(),
            content_type: "image/png".to_string(),
            bytes: Vec::new(),
        };
        assert_eq!(bare.extension(), "bin");
    }

    #[test]
    fn test_feed_post_author_fallback() {
        let post = Post {
            id: PostId::new(),
            user_id: UserId::new(),
            content: "hello".to_string(),
            media_url: None,
            media_type: None,
            created_at: Utc::now(),
        };
        let orphan = FeedPost {
            post: post.clone(),
            author: None,
        };
        assert_eq!(orphan.author_name(), "user");

        let owned = FeedPost {
            post,
            author: Some(AuthorSummary {
                username: "alice".to_string(),
                full_name: None,
                avatar_url: None,
            }),
        };
        assert_eq!(owned.author_name(), "alice");
    }

    #[test]
    fn test_feed_post_serializes_flat() {
        let feed_post = FeedPost {
            post: Post {
                id: PostId::new(),
                user_id: UserId::new(),
                content: "flat".to_string(),
                media_url: None,
                media_type: Some(MediaType::Image),
                created_at: Utc::now(),
            },
            author: None,
        };
        let json = serde_json::to_value(&feed_post).unwrap();
        assert_eq!(json["content"], "flat");
        assert_eq!(json["media_type"], "image");
        assert!(json["author"].is_null());
    }
}
