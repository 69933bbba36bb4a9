//! User service: uniqueness, pagination bounds and partial updates on top of
//! a [`UserRepository`].

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info};

use crate::constants::{
    DEFAULT_OFFSET, DEFAULT_PAGE_SIZE, ERR_EMAIL_EXISTS, ERR_EMAIL_IN_USE, MAX_PAGE_SIZE,
};
use crate::context::RequestContext;
use crate::errors::{RepositoryError, ServiceError};
use crate::models::{NewUser, PaginationResult, User, UserChanges};
use crate::repositories::UserRepository;
use crate::utils::mask_email;
use crate::validators::normalize_email;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    async fn create_user(&self, ctx: &RequestContext, user: NewUser) -> Result<User, ServiceError>;

    async fn get_user(&self, ctx: &RequestContext, id: i64) -> Result<User, ServiceError>;

    /// `limit` outside `1..=100` falls back to 10, a negative `offset` to 0.
    async fn get_users(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<PaginationResult, ServiceError>;

    async fn update_user(
        &self,
        ctx: &RequestContext,
        id: i64,
        changes: UserChanges,
    ) -> Result<User, ServiceError>;

    async fn delete_user(&self, ctx: &RequestContext, id: i64) -> Result<(), ServiceError>;
}

pub struct UserServiceImpl {
    repository: Arc<dyn UserRepository>,
}

impl UserServiceImpl {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

/// Wrap a repository failure with `context`; a missing row maps to `NotFound`.
fn storage(context: &'static str) -> impl FnOnce(RepositoryError) -> ServiceError {
    move |err| match err {
        RepositoryError::NotFound => ServiceError::NotFound,
        RepositoryError::Storage(source) => ServiceError::Storage { context, source },
    }
}

/// Like [`storage`], but a unique violation becomes `Conflict(message)`.
fn write_failure(
    context: &'static str,
    message: &'static str,
) -> impl FnOnce(RepositoryError) -> ServiceError {
    move |err| match err {
        RepositoryError::Storage(source) if source.is_unique_violation() => {
            ServiceError::Conflict(message.to_string())
        }
        other => storage(context)(other),
    }
}

fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    let limit = if limit <= 0 || limit > MAX_PAGE_SIZE {
        DEFAULT_PAGE_SIZE
    } else {
        limit
    };
    (limit, if offset < 0 { DEFAULT_OFFSET } else { offset })
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn create_user(&self, ctx: &RequestContext, user: NewUser) -> Result<User, ServiceError> {
        let user = NewUser {
            email: normalize_email(&user.email),
            name: user.name.trim().to_string(),
        };

        if self
            .repository
            .get_by_email(ctx, &user.email)
            .await
            .map_err(storage("failed to check email"))?
            .is_some()
        {
            return Err(ServiceError::Conflict(ERR_EMAIL_EXISTS.to_string()));
        }

        let created = self
            .repository
            .create(ctx, &user)
            .await
            .map_err(write_failure("failed to create user", ERR_EMAIL_EXISTS))?;

        info!(
            "[{}] Created user {} ({})",
            ctx.request_id(),
            created.id,
            mask_email(&created.email)
        );
        Ok(created)
    }

    async fn get_user(&self, ctx: &RequestContext, id: i64) -> Result<User, ServiceError> {
        self.repository
            .get_by_id(ctx, id)
            .await
            .map_err(storage("failed to get user"))?
            .ok_or(ServiceError::NotFound)
    }

    async fn get_users(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<PaginationResult, ServiceError> {
        let (limit, offset) = clamp_page(limit, offset);
        debug!(
            "[{}] Listing users (limit={}, offset={})",
            ctx.request_id(),
            limit,
            offset
        );

        let (users, total) = self
            .repository
            .get_all(ctx, limit, offset)
            .await
            .map_err(storage("failed to list users"))?;

        Ok(PaginationResult::new(users, total, limit, offset))
    }

    async fn update_user(
        &self,
        ctx: &RequestContext,
        id: i64,
        changes: UserChanges,
    ) -> Result<User, ServiceError> {
        let mut user = self
            .repository
            .get_by_id(ctx, id)
            .await
            .map_err(storage("failed to get user"))?
            .ok_or(ServiceError::NotFound)?;

        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            if email != user.email {
                let holder = self
                    .repository
                    .get_by_email(ctx, &email)
                    .await
                    .map_err(storage("failed to check email"))?;
                if holder.is_some_and(|other| other.id != id) {
                    return Err(ServiceError::Conflict(ERR_EMAIL_IN_USE.to_string()));
                }
                user.email = email;
            }
        }

        if let Some(name) = changes.name {
            user.name = name.trim().to_string();
        }

        user.updated_at = self
            .repository
            .update(ctx, id, &user.email, &user.name)
            .await
            .map_err(write_failure("failed to update user", ERR_EMAIL_IN_USE))?;

        info!("[{}] Updated user {}", ctx.request_id(), id);
        Ok(user)
    }

    async fn delete_user(&self, ctx: &RequestContext, id: i64) -> Result<(), ServiceError> {
        self.repository
            .delete(ctx, id)
            .await
            .map_err(storage("failed to delete user"))?;

        info!("[{}] Deleted user {}", ctx.request_id(), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::errors::StorageError;
    use crate::repositories::memory::InMemoryUserRepository;

    fn setup() -> (Arc<InMemoryUserRepository>, UserServiceImpl) {
        let repo = Arc::new(InMemoryUserRepository::new());
        let service = UserServiceImpl::new(repo.clone());
        (repo, service)
    }

    fn ctx() -> RequestContext {
        RequestContext::background(Duration::from_secs(5))
    }

    fn new_user(email: &str, name: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            name: name.to_string(),
        }
    }

    #[actix_web::test]
    async fn test_create_user_populates_id_and_timestamps() {
        let (_, service) = setup();
        let user = service
            .create_user(&ctx(), new_user(" Jane@Example.com ", "  Jane Doe "))
            .await
            .unwrap();

        assert!(user.id > 0);
        assert_eq!(user.email, "jane@example.com");
        assert_eq!(user.name, "Jane Doe");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[actix_web::test]
    async fn test_create_user_with_existing_email_conflicts() {
        let (repo, service) = setup();
        service
            .create_user(&ctx(), new_user("jane@example.com", "Jane"))
            .await
            .unwrap();

        let err = service
            .create_user(&ctx(), new_user("JANE@example.com ", "Other Jane"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ERR_EMAIL_EXISTS));
        assert_eq!(repo.writes(), 1);
    }

    #[actix_web::test]
    async fn test_create_user_losing_uniqueness_race_conflicts() {
        let (repo, service) = setup();
        repo.seed(1);
        repo.simulate_stale_email_lookups();

        let err = service
            .create_user(&ctx(), new_user("user1@example.com", "Racer"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ERR_EMAIL_EXISTS));
    }

    #[actix_web::test]
    async fn test_created_user_can_be_fetched() {
        let (_, service) = setup();
        let created = service
            .create_user(&ctx(), new_user("fetch@example.com", "Fetch Me"))
            .await
            .unwrap();

        let fetched = service.get_user(&ctx(), created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[actix_web::test]
    async fn test_get_unknown_user_is_not_found() {
        let (_, service) = setup();
        assert!(matches!(
            service.get_user(&ctx(), 42).await,
            Err(ServiceError::NotFound)
        ));
    }

    #[actix_web::test]
    async fn test_get_users_clamps_out_of_range_paging() {
        let (repo, service) = setup();
        repo.seed(15);

        let clamped = service.get_users(&ctx(), 0, -5).await.unwrap();
        let default = service.get_users(&ctx(), 10, 0).await.unwrap();
        assert_eq!(clamped, default);
        assert_eq!(clamped.limit, 10);
        assert_eq!(clamped.offset, 0);

        let oversized = service.get_users(&ctx(), 101, 0).await.unwrap();
        assert_eq!(oversized.limit, 10);
        let max = service.get_users(&ctx(), 100, 0).await.unwrap();
        assert_eq!(max.limit, 100);
        assert_eq!(max.users.len(), 15);
    }

    #[actix_web::test]
    async fn test_get_users_counts_pages() {
        let (repo, service) = setup();
        let seeded = repo.seed(25);

        let page = service.get_users(&ctx(), 10, 10).await.unwrap();
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.users.len(), 10);
        assert_eq!(page.users[0].id, seeded[10].id);
        assert!(page.users.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[actix_web::test]
    async fn test_name_only_update_keeps_email() {
        let (repo, service) = setup();
        let original = repo.seed(1).remove(0);

        let updated = service
            .update_user(
                &ctx(),
                original.id,
                UserChanges {
                    email: None,
                    name: Some("  Renamed ".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.email, original.email);
        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(service.get_user(&ctx(), original.id).await.unwrap(), updated);
    }

    #[actix_web::test]
    async fn test_update_email_normalizes_and_applies() {
        let (repo, service) = setup();
        let original = repo.seed(1).remove(0);

        let updated = service
            .update_user(
                &ctx(),
                original.id,
                UserChanges {
                    email: Some(" New@Example.com".to_string()),
                    name: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.name, original.name);
    }

    #[actix_web::test]
    async fn test_update_to_own_email_is_not_a_conflict() {
        let (repo, service) = setup();
        let original = repo.seed(1).remove(0);

        let updated = service
            .update_user(
                &ctx(),
                original.id,
                UserChanges {
                    email: Some(original.email.to_uppercase()),
                    name: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, original.email);
    }

    #[actix_web::test]
    async fn test_update_to_taken_email_conflicts() {
        let (repo, service) = setup();
        let users = repo.seed(2);

        let err = service
            .update_user(
                &ctx(),
                users[0].id,
                UserChanges {
                    email: Some(users[1].email.clone()),
                    name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ERR_EMAIL_IN_USE));
        assert_eq!(repo.writes(), 0);
    }

    #[actix_web::test]
    async fn test_update_losing_uniqueness_race_conflicts() {
        let (repo, service) = setup();
        let users = repo.seed(2);
        repo.simulate_stale_email_lookups();

        let err = service
            .update_user(
                &ctx(),
                users[0].id,
                UserChanges {
                    email: Some(users[1].email.clone()),
                    name: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(ref m) if m == ERR_EMAIL_IN_USE));
    }

    #[actix_web::test]
    async fn test_update_unknown_user_is_not_found_without_write() {
        let (repo, service) = setup();
        let err = service
            .update_user(
                &ctx(),
                99,
                UserChanges {
                    email: None,
                    name: Some("Nobody".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));
        assert_eq!(repo.writes(), 0);
    }

    #[actix_web::test]
    async fn test_delete_user_then_get_is_not_found() {
        let (repo, service) = setup();
        let user = repo.seed(1).remove(0);

        service.delete_user(&ctx(), user.id).await.unwrap();
        assert!(matches!(
            service.get_user(&ctx(), user.id).await,
            Err(ServiceError::NotFound)
        ));
        assert!(matches!(
            service.delete_user(&ctx(), user.id).await,
            Err(ServiceError::NotFound)
        ));
    }

    #[actix_web::test]
    async fn test_storage_failures_carry_operation_context() {
        let (repo, service) = setup();
        repo.fail_next_with(StorageError::Timeout {
            operation: "list users",
            after: Duration::from_secs(10),
        });

        let err = service.get_users(&ctx(), 10, 0).await.unwrap_err();
        match &err {
            ServiceError::Storage { context, source } => {
                assert_eq!(*context, "failed to list users");
                assert!(matches!(source, StorageError::Timeout { .. }));
            }
            other => panic!("expected storage error, got {other:?}"),
        }
        assert_eq!(
            crate::errors::error_chain(&err),
            "failed to list users: list users timed out after 10s"
        );
    }

    #[actix_web::test]
    async fn test_cancelled_request_never_reaches_storage() {
        let (repo, service) = setup();
        let token = CancellationToken::new();
        token.cancel();
        let ctx = RequestContext::new("req-cancelled", Duration::from_secs(5), token);

        let err = service
            .create_user(&ctx, new_user("late@example.com", "Late"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Storage {
                source: StorageError::Cancelled { .. },
                ..
            }
        ));
        assert_eq!(repo.writes(), 0);
    }
}
