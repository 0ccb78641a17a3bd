//! SQLite profile repository.
//!
//! Implements `ProfileRepository` from `shutterfeed-core` and publishes a
//! `TableChange` on every successful write.

use shutterfeed_core::event::EventBus;
use shutterfeed_core::repository::ProfileRepository;
use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::event::{ChangeKind, Table, TableChange};
use shutterfeed_types::profile::{Profile, ProfileUpdate};
use shutterfeed_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_error};

pub struct SqliteProfileRepository {
    pool: DatabasePool,
    changes: EventBus<TableChange>,
}

impl SqliteProfileRepository {
    pub fn new(pool: DatabasePool, changes: EventBus<TableChange>) -> Self {
        Self { pool, changes }
    }

    fn notify(&self, kind: ChangeKind, id: &UserId) {
        self.changes
            .publish(TableChange::new(Table::Profiles, kind, id.to_string()));
    }

    async fn fetch(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.map(|row| ProfileRow::from_row(&row).map_err(query_error)?.into_profile())
            .transpose()
    }
}

/// Internal row type for mapping SQLite rows to `Profile`.
struct ProfileRow {
    id: String,
    username: String,
    full_name: Option<String>,
    bio: Option<String>,
    avatar_url: Option<String>,
    is_setup_complete: i64,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            full_name: row.try_get("full_name")?,
            bio: row.try_get("bio")?,
            avatar_url: row.try_get("avatar_url")?,
            is_setup_complete: row.try_get("is_setup_complete")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<Profile, RepositoryError> {
        let id = self
            .id
            .parse::<UserId>()
            .map_err(|e| RepositoryError::Query(format!("invalid profile id: {e}")))?;

        Ok(Profile {
            id,
            username: self.username,
            full_name: self.full_name,
            bio: self.bio,
            avatar_url: self.avatar_url,
            is_setup_complete: self.is_setup_complete != 0,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

impl ProfileRepository for SqliteProfileRepository {
    async fn get_profile(&self, id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        self.fetch(id).await
    }

    async fn get_profiles(&self, ids: &[UserId]) -> Result<Vec<Profile>, RepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("SELECT * FROM profiles WHERE id IN ({placeholders})");
        let mut query = sqlx::query(&sql);
        for id in ids {
            query = query.bind(id.to_string());
        }

        let rows = query
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| ProfileRow::from_row(row).map_err(query_error)?.into_profile())
            .collect()
    }

    async fn create_profile(&self, profile: &Profile) -> Result<Profile, RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO profiles (id, username, full_name, bio, avatar_url, is_setup_complete, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(profile.id.to_string())
        .bind(&profile.username)
        .bind(&profile.full_name)
        .bind(&profile.bio)
        .bind(&profile.avatar_url)
        .bind(profile.is_setup_complete as i64)
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => {
                self.notify(ChangeKind::Insert, &profile.id);
                Ok(profile.clone())
            }
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "profile for '{}' or username '{}' already exists",
                profile.id, profile.username
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn update_profile(
        &self,
        id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        // MAX keeps the setup flag from ever going back to 0.
        let result = sqlx::query(
            "UPDATE profiles SET
                username = COALESCE(?, username),
                full_name = COALESCE(?, full_name),
                bio = COALESCE(?, bio),
                avatar_url = COALESCE(?, avatar_url),
                is_setup_complete = MAX(is_setup_complete, ?),
                updated_at = ?
             WHERE id = ?",
        )
        .bind(&update.username)
        .bind(&update.full_name)
        .bind(&update.bio)
        .bind(&update.avatar_url)
        .bind(update.mark_setup_complete as i64)
        .bind(format_datetime(&chrono::Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Err(RepositoryError::NotFound),
            Ok(_) => {
                self.notify(ChangeKind::Update, id);
                self.fetch(id).await?.ok_or(RepositoryError::NotFound)
            }
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(
                update.username.clone().unwrap_or_default(),
            )),
            Err(e) => Err(query_error(e)),
        }
    }

    async fn is_username_taken(
        &self,
        username: &str,
        excluding: &UserId,
    ) -> Result<bool, RepositoryError> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM profiles WHERE username = ? AND id != ? LIMIT 1")
                .bind(username)
                .bind(excluding.to_string())
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(query_error)?;
        Ok(row.is_some())
    }
}
