//! SQLite post repository.

use shutterfeed_core::event::EventBus;
use shutterfeed_core::repository::PostRepository;
use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::event::{ChangeKind, Table, TableChange};
use shutterfeed_types::post::{MediaType, Post, PostId};
use shutterfeed_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};
use crate::realtime::Fingerprint;

/// SQLite-backed `PostRepository`. Publishes a `TableChange` after each write.
#[derive(Clone)]
pub struct SqlitePostRepository {
    pool: DatabasePool,
    changes: EventBus<TableChange>,
}

impl SqlitePostRepository {
    pub fn new(pool: DatabasePool, changes: EventBus<TableChange>) -> Self {
        Self { pool, changes }
    }

    async fn list(&self, user_id: Option<&UserId>) -> Result<Vec<Post>, RepositoryError> {
        let rows = match user_id {
            Some(user_id) => {
                sqlx::query(
                    "SELECT * FROM posts WHERE user_id = ? ORDER BY created_at DESC, id DESC",
                )
                .bind(user_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query("SELECT * FROM posts ORDER BY created_at DESC, id DESC")
                    .fetch_all(&self.pool.reader)
                    .await
            }
        }
        .map_err(query_error)?;

        rows.iter()
            .map(|row| PostRow::from_row(row).map_err(query_error)?.into_post())
            .collect()
    }
}

struct PostRow {
    id: String,
    user_id: String,
    content: String,
    media_url: Option<String>,
    media_type: Option<String>,
    created_at: String,
}

impl PostRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            content: row.try_get("content")?,
            media_url: row.try_get("media_url")?,
            media_type: row.try_get("media_type")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_post(self) -> Result<Post, RepositoryError> {
        let id = self
            .id
            .parse::<PostId>()
            .map_err(|e| RepositoryError::Query(format!("invalid post id: {e}")))?;
        let user_id = self
            .user_id
            .parse::<UserId>()
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        let media_type = self
            .media_type
            .as_deref()
            .map(str::parse::<MediaType>)
            .transpose()
            .map_err(RepositoryError::Query)?;

        Ok(Post {
            id,
            user_id,
            content: self.content,
            media_url: self.media_url,
            media_type,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl PostRepository for SqlitePostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        self.list(None).await
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Post>, RepositoryError> {
        self.list(Some(user_id)).await
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| PostRow::from_row(&row).map_err(query_error)?.into_post())
            .transpose()
    }

    async fn create_post(&self, post: &Post) -> Result<Post, RepositoryError> {
        sqlx::query(
            "INSERT INTO posts (id, user_id, content, media_url, media_type, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(post.id.to_string())
        .bind(post.user_id.to_string())
        .bind(&post.content)
        .bind(&post.media_url)
        .bind(post.media_type.map(|t| t.to_string()))
        .bind(format_datetime(&post.created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        self.changes.publish(TableChange::new(
            Table::Posts,
            ChangeKind::Insert,
            post.id.to_string(),
        ));
        Ok(post.clone())
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        self.changes.publish(TableChange::new(
            Table::Posts,
            ChangeKind::Delete,
            id.to_string(),
        ));
        Ok(())
    }
}

impl Fingerprint for SqlitePostRepository {
    /// Row count plus newest id; changes on any insert or delete, including
    /// writes from other processes sharing the database file.
    async fn fingerprint(&self) -> Result<String, RepositoryError> {
        let (count, newest): (i64, Option<String>) =
            sqlx::query_as("SELECT COUNT(*), MAX(id) FROM posts")
                .fetch_one(&self.pool.reader)
                .await
                .map_err(query_error)?;
        Ok(format!("{count}:{}", newest.unwrap_or_default()))
    }
}
