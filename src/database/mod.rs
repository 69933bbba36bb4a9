//! PostgreSQL storage gateway.
//!
//! Owns the connection pool and schema migrations, and provides
//! [`run_bounded`], which every repository call goes through so that a stalled
//! backend cannot hold a request past its deadline.

use std::future::Future;
use std::time::Duration;

use log::{debug, info};
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::PoolSettings;
use crate::context::RequestContext;
use crate::errors::StorageError;

/// Budget for opening the pool and the startup ping.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for applying all pending migrations.
pub const MIGRATION_TIMEOUT: Duration = Duration::from_secs(30);

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Build the pool and verify connectivity with a ping.
    pub async fn connect(settings: &PoolSettings) -> Result<Self, StorageError> {
        debug!("Creating database pool: {:?}", settings);

        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .max_lifetime(settings.max_lifetime)
            .acquire_timeout(CONNECT_TIMEOUT)
            .connect_lazy(&settings.database_url)
            .map_err(StorageError::Connect)?;

        let database = Self { pool };
        database
            .ping(&RequestContext::background(CONNECT_TIMEOUT))
            .await?;

        info!(
            "Connected to database (max_connections={}, min_connections={}, max_lifetime={:?})",
            settings.max_connections, settings.min_connections, settings.max_lifetime
        );
        Ok(database)
    }

    #[cfg(test)]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn ping(&self, ctx: &RequestContext) -> Result<(), StorageError> {
        run_bounded(ctx, CONNECT_TIMEOUT, "ping database", async {
            sqlx::query("SELECT 1").execute(&self.pool).await.map(|_| ())
        })
        .await
    }

    pub async fn migrate(&self) -> Result<(), StorageError> {
        match tokio::time::timeout(MIGRATION_TIMEOUT, MIGRATOR.run(&self.pool)).await {
            Ok(result) => result.map_err(StorageError::from),
            Err(_) => Err(StorageError::Timeout {
                operation: "run migrations",
                after: MIGRATION_TIMEOUT,
            }),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Run a storage future under `budget`, further capped by the time left on
/// the request deadline, aborting as soon as the request is cancelled.
pub async fn run_bounded<T, F>(
    ctx: &RequestContext,
    budget: Duration,
    operation: &'static str,
    fut: F,
) -> Result<T, StorageError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    if ctx.is_cancelled() {
        return Err(StorageError::Cancelled { operation });
    }

    let limit = budget.min(ctx.remaining());

    tokio::select! {
        biased;
        _ = ctx.cancellation().cancelled() => Err(StorageError::Cancelled { operation }),
        outcome = tokio::time::timeout(limit, fut) => match outcome {
            Ok(result) => result.map_err(|source| StorageError::from_sqlx(operation, source)),
            Err(_) => Err(StorageError::Timeout { operation, after: limit }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_util::sync::CancellationToken;

    #[actix_web::test]
    async fn test_completed_future_passes_through() {
        let ctx = RequestContext::background(Duration::from_secs(1));
        let value = run_bounded(&ctx, Duration::from_secs(1), "noop", async {
            Ok::<_, sqlx::Error>(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
    }

    #[actix_web::test]
    async fn test_stalled_future_times_out_at_budget() {
        let ctx = RequestContext::background(Duration::from_secs(5));
        let err = run_bounded(
            &ctx,
            Duration::from_millis(20),
            "stalled query",
            std::future::pending::<Result<(), sqlx::Error>>(),
        )
        .await
        .unwrap_err();

        match err {
            StorageError::Timeout { operation, after } => {
                assert_eq!(operation, "stalled query");
                assert_eq!(after, Duration::from_millis(20));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_request_deadline_caps_budget() {
        let ctx = RequestContext::background(Duration::from_millis(20));
        let err = run_bounded(
            &ctx,
            Duration::from_secs(10),
            "stalled query",
            std::future::pending::<Result<(), sqlx::Error>>(),
        )
        .await
        .unwrap_err();

        match err {
            StorageError::Timeout { after, .. } => assert!(after <= Duration::from_millis(20)),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[actix_web::test]
    async fn test_cancelled_context_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new("req-1", Duration::from_secs(5), token);

        let err = run_bounded(&ctx, Duration::from_secs(5), "get user by id", async {
            Ok::<_, sqlx::Error>(())
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Cancelled {
                operation: "get user by id"
            }
        ));
    }

    #[actix_web::test]
    async fn test_cancellation_interrupts_in_flight_call() {
        let token = CancellationToken::new();
        let ctx = RequestContext::new("req-2", Duration::from_secs(5), token.clone());

        let canceller = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        };
        let call = run_bounded(
            &ctx,
            Duration::from_secs(5),
            "list users",
            std::future::pending::<Result<(), sqlx::Error>>(),
        );

        let (_, result) = tokio::join!(canceller, call);
        assert!(matches!(result, Err(StorageError::Cancelled { .. })));
    }
}
