//! Local auth accounts and issued sessions.
//!
//! Passwords are stored as Argon2id PHC strings; sessions are stored under
//! the SHA-256 digest of the token, never the token itself.

use chrono::{DateTime, Utc};
use shutterfeed_types::error::RepositoryError;
use shutterfeed_types::user::UserId;
use sqlx::Row;

use super::pool::DatabasePool;
use super::{format_datetime, is_unique_violation, parse_datetime, query_error};

/// A registered local account.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A session row joined with its account's email.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub account_id: UserId,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SqliteAccountRepository {
    pool: DatabasePool,
}

impl SqliteAccountRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert a new account. `Conflict` if the email is registered.
    pub async fn create(&self, account: &Account) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO accounts (id, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(account.id.to_string())
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(format_datetime(&account.created_at))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(RepositoryError::Conflict(format!(
                "account '{}' already exists",
                account.email
            ))),
            Err(e) => Err(query_error(e)),
        }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let id: String = row.try_get("id").map_err(query_error)?;
        let created_at: String = row.try_get("created_at").map_err(query_error)?;
        Ok(Some(Account {
            id: parse_user_id(&id)?,
            email: row.try_get("email").map_err(query_error)?,
            password_hash: row.try_get("password_hash").map_err(query_error)?,
            created_at: parse_datetime(&created_at)?,
        }))
    }

    pub async fn insert_session(
        &self,
        token_hash: &str,
        account_id: &UserId,
        expires_at: &DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sessions (token_hash, account_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
        )
        .bind(token_hash)
        .bind(account_id.to_string())
        .bind(format_datetime(&Utc::now()))
        .bind(format_datetime(expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;
        Ok(())
    }

    /// Look up a live session. Expired rows are treated as absent.
    pub async fn find_session(
        &self,
        token_hash: &str,
    ) -> Result<Option<SessionRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT s.account_id, s.expires_at, a.email
             FROM sessions s JOIN accounts a ON a.id = s.account_id
             WHERE s.token_hash = ? AND s.expires_at > ?",
        )
        .bind(token_hash)
        .bind(format_datetime(&Utc::now()))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let account_id: String = row.try_get("account_id").map_err(query_error)?;
        let expires_at: String = row.try_get("expires_at").map_err(query_error)?;
        Ok(Some(SessionRecord {
            account_id: parse_user_id(&account_id)?,
            email: row.try_get("email").map_err(query_error)?,
            expires_at: parse_datetime(&expires_at)?,
        }))
    }

    /// Delete a session. Returns whether a row existed.
    pub async fn delete_session(&self, token_hash: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop every expired session row. Returns how many were removed.
    pub async fn purge_expired(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }
}

fn parse_user_id(s: &str) -> Result<UserId, RepositoryError> {
    s.parse::<UserId>()
        .map_err(|e| RepositoryError::Query(format!("invalid account id: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;
    use chrono::Duration;

    fn account(email: &str) -> Account {
        Account {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find_account() {
        let repo = SqliteAccountRepository::new(test_pool().await);
        let acct = account("a@example.com");
        repo.create(&acct).await.unwrap();

        let found = repo.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, acct.id);
        assert!(repo.find_by_email("b@example.com").await.unwrap().is_none());

        let err = repo.create(&account("a@example.com")).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = SqliteAccountRepository::new(test_pool().await);
        let acct = account("s@example.com");
        repo.create(&acct).await.unwrap();

        let expires = Utc::now() + Duration::hours(1);
        repo.insert_session("hash-1", &acct.id, &expires).await.unwrap();

        let record = repo.find_session("hash-1").await.unwrap().unwrap();
        assert_eq!(record.account_id, acct.id);
        assert_eq!(record.email, "s@example.com");

        assert!(repo.delete_session("hash-1").await.unwrap());
        assert!(!repo.delete_session("hash-1").await.unwrap());
        assert!(repo.find_session("hash-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_sessions_are_invisible_and_purged() {
        let repo = SqliteAccountRepository::new(test_pool().await);
        let acct = account("e@example.com");
        repo.create(&acct).await.unwrap();

        let past = Utc::now() - Duration::minutes(5);
        repo.insert_session("old", &acct.id, &past).await.unwrap();
        assert!(repo.find_session("old").await.unwrap().is_none());
        assert_eq!(repo.purge_expired().await.unwrap(), 1);
    }
}
