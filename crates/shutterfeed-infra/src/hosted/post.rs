//! Posts table over the hosted REST API.

use reqwest::Method;
use serde::Deserialize;
use shutterfeed_core::event::EventBus;
use shutterfeed_core::repository::PostRepository;
use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::event::{ChangeKind, Table, TableChange};
use shutterfeed_types::post::{Post, PostId};
use shutterfeed_types::user::UserId;

use super::client::HostedClient;
use crate::realtime::Fingerprint;

const POSTS: &str = "/rest/v1/posts";

#[derive(Clone)]
pub struct HostedPostRepository {
    client: HostedClient,
    changes: EventBus<TableChange>,
}

impl HostedPostRepository {
    pub fn new(client: HostedClient, changes: EventBus<TableChange>) -> Self {
        Self { client, changes }
    }

    async fn list(&self, filters: &[(&str, String)]) -> Result<Vec<Post>, RepositoryError> {
        let request = self
            .client
            .request(Method::GET, POSTS)
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .query(filters);
        self.client.send_json(request).await
    }
}

impl PostRepository for HostedPostRepository {
    async fn list_posts(&self) -> Result<Vec<Post>, RepositoryError> {
        self.list(&[]).await
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Post>, RepositoryError> {
        self.list(&[("user_id", format!("eq.{user_id}"))]).await
    }

    async fn get_post(&self, id: &PostId) -> Result<Option<Post>, RepositoryError> {
        let rows = self.list(&[("id", format!("eq.{id}"))]).await?;
        Ok(rows.into_iter().next())
    }

    async fn create_post(&self, post: &Post) -> Result<Post, RepositoryError> {
        let request = self
            .client
            .request(Method::POST, POSTS)
            .header("Prefer", "return=representation")
            .json(post);
        let rows: Vec<Post> = self.client.send_json(request).await?;
        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Query("insert returned no row".to_string()))?;
        self.changes.publish(TableChange::new(
            Table::Posts,
            ChangeKind::Insert,
            created.id.to_string(),
        ));
        Ok(created)
    }

    async fn delete_post(&self, id: &PostId) -> Result<(), RepositoryError> {
        let request = self
            .client
            .request(Method::DELETE, POSTS)
            .query(&[("id", format!("eq.{id}"))])
            .header("Prefer", "return=representation");
        let deleted: Vec<Post> = self.client.send_json(request).await?;
        if deleted.is_empty() {
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

#[derive(Deserialize)]
struct NewestRow {
    id: String,
}

impl Fingerprint for HostedPostRepository {
    /// Exact row count from `Content-Range` plus the newest id.
    async fn fingerprint(&self) -> Result<String, RepositoryError> {
        let request = self
            .client
            .request(Method::GET, POSTS)
            .query(&[("select", "id"), ("order", "created_at.desc"), ("limit", "1")])
            .header("Prefer", "count=exact");
        let response = self.client.send(request).await?;
        let count = response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(total_from_content_range)
            .unwrap_or_default();
        let rows: Vec<NewestRow> = response
            .json()
            .await
            .map_err(|e| RepositoryError::Query(format!("failed to parse response: {e}")))?;
        let newest = rows.into_iter().next().map(|r| r.id).unwrap_or_default();
        Ok(format!("{count}:{newest}"))
    }
}

/// Total from a `Content-Range` header such as `0-0/42` or `*/0`.
fn total_from_content_range(header: &str) -> Option<String> {
    header
        .rsplit_once('/')
        .map(|(_, total)| total.to_string())
        .filter(|total| total != "*")
}
