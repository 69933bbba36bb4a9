//! User repository for all PostgreSQL operations on the `users` table.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;

use crate::context::RequestContext;
use crate::database::{run_bounded, Database};
use crate::errors::RepositoryError;
use crate::models::{NewUser, User};

/// Budget for single-row reads and writes.
pub const SINGLE_ROW_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for the paginated list, count and page together.
pub const LIST_TIMEOUT: Duration = Duration::from_secs(10);

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user and return it with the store-assigned id and timestamps.
    async fn create(&self, ctx: &RequestContext, user: &NewUser) -> Result<User, RepositoryError>;

    async fn get_by_id(&self, ctx: &RequestContext, id: i64)
        -> Result<Option<User>, RepositoryError>;

    /// Exact match against an already-normalized email.
    async fn get_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// One page ordered by id, plus the total row count.
    async fn get_all(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), RepositoryError>;

    /// Overwrite email and name, returning the refreshed `updated_at`.
    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        email: &str,
        name: &str,
    ) -> Result<DateTime<Utc>, RepositoryError>;

    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), RepositoryError>;
}

pub struct PgUserRepository {
    db: Database,
}

impl PgUserRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, ctx: &RequestContext, user: &NewUser) -> Result<User, RepositoryError> {
        let pool = self.db.pool();
        let created = run_bounded(ctx, SINGLE_ROW_TIMEOUT, "insert user", async {
            sqlx::query_as::<_, User>(
                "INSERT INTO users (email, name) VALUES ($1, $2) \
                 RETURNING id, email, name, created_at, updated_at",
            )
            .bind(&user.email)
            .bind(&user.name)
            .fetch_one(pool)
            .await
        })
        .await?;

        debug!("[{}] Repository: inserted user {}", ctx.request_id(), created.id);
        Ok(created)
    }

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> Result<Option<User>, RepositoryError> {
        debug!("[{}] Repository: finding user by ID: {}", ctx.request_id(), id);
        let pool = self.db.pool();
        let user = run_bounded(ctx, SINGLE_ROW_TIMEOUT, "get user by id", async {
            sqlx::query_as::<_, User>(
                "SELECT id, email, name, created_at, updated_at FROM users WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(pool)
            .await
        })
        .await?;
        Ok(user)
    }

    async fn get_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let pool = self.db.pool();
        let user = run_bounded(ctx, SINGLE_ROW_TIMEOUT, "get user by email", async {
            sqlx::query_as::<_, User>(
                "SELECT id, email, name, created_at, updated_at FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(pool)
            .await
        })
        .await?;
        Ok(user)
    }

    async fn get_all(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        debug!(
            "[{}] Repository: listing users (limit={}, offset={})",
            ctx.request_id(),
            limit,
            offset
        );
        let pool = self.db.pool();
        let page = run_bounded(ctx, LIST_TIMEOUT, "list users", async {
            let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(pool)
                .await?;
            let users = sqlx::query_as::<_, User>(
                "SELECT id, email, name, created_at, updated_at FROM users \
                 ORDER BY id LIMIT $1 OFFSET $2",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
            Ok::<_, sqlx::Error>((users, total))
        })
        .await?;
        Ok(page)
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        email: &str,
        name: &str,
    ) -> Result<DateTime<Utc>, RepositoryError> {
        let pool = self.db.pool();
        let updated_at = run_bounded(ctx, SINGLE_ROW_TIMEOUT, "update user", async {
            sqlx::query_scalar::<_, DateTime<Utc>>(
                "UPDATE users SET email = $1, name = $2, updated_at = NOW() \
                 WHERE id = $3 RETURNING updated_at",
            )
            .bind(email)
            .bind(name)
            .bind(id)
            .fetch_optional(pool)
            .await
        })
        .await?;

        updated_at.ok_or(RepositoryError::NotFound)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), RepositoryError> {
        let pool = self.db.pool();
        let result = run_bounded(ctx, SINGLE_ROW_TIMEOUT, "delete user", async {
            sqlx::query("DELETE FROM users WHERE id = $1")
                .bind(id)
                .execute(pool)
                .await
        })
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        debug!("[{}] Repository: deleted user {}", ctx.request_id(), id);
        Ok(())
    }
}
