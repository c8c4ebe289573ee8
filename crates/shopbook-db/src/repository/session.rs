//! # Session Repository
//!
//! One row per issued login token. A token is only honoured while its row
//! exists, so logout and blocking take effect immediately.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// A login session, keyed by the token's `jti`.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Session {
    pub id: String,
    pub account_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    pub async fn insert(&self, session: &Session) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO sessions (id, account_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&session.id)
        .bind(&session.account_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        debug!(account_id = %session.account_id, "Session opened");
        Ok(())
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT id, account_id, created_at, expires_at FROM sessions WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Deletes a session. Returns whether it existed.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drops the expired sessions of one account. Called on login.
    pub async fn prune_for_account(&self, account_id: &str, now: DateTime<Utc>) -> DbResult<u64> {
        let sessions = sqlx::query_as::<_, Session>(
            "SELECT id, account_id, created_at, expires_at FROM sessions WHERE account_id = ?1",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        let mut pruned = 0;
        for session in sessions.iter().filter(|s| s.is_expired(now)) {
            if self.delete(&session.id).await? {
                pruned += 1;
            }
        }

        if pruned > 0 {
            debug!(account_id = %account_id, pruned, "Pruned expired sessions");
        }
        Ok(pruned)
    }
}
