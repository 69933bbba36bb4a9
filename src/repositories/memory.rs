//! In-memory [`UserRepository`] used by service and handler tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::UserRepository;
use crate::context::RequestContext;
use crate::errors::{RepositoryError, StorageError};
use crate::models::{NewUser, User};

#[derive(Default)]
struct State {
    users: BTreeMap<i64, User>,
    next_id: i64,
}

/// Enforces email uniqueness like the `users_email_key` constraint and honors
/// request cancellation.
#[derive(Default)]
pub struct InMemoryUserRepository {
    state: Mutex<State>,
    writes: AtomicUsize,
    stale_email_lookups: Mutex<bool>,
    fail_next: Mutex<Option<StorageError>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `count` users named `User <n>` with emails `user<n>@example.com`.
    pub fn seed(&self, count: usize) -> Vec<User> {
        let mut state = self.state.lock().unwrap();
        (1..=count)
            .map(|n| {
                let user = insert(
                    &mut state,
                    &NewUser {
                        email: format!("user{}@example.com", n),
                        name: format!("User {}", n),
                    },
                );
                user.clone()
            })
            .collect()
    }

    /// Number of successful inserts, updates and deletes.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make `get_by_email` miss, as when another request inserts the same email
    /// between the lookup and the write.
    pub fn simulate_stale_email_lookups(&self) {
        *self.stale_email_lookups.lock().unwrap() = true;
    }

    /// Fail the next call with `err`.
    pub fn fail_next_with(&self, err: StorageError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    fn check(&self, ctx: &RequestContext, operation: &'static str) -> Result<(), RepositoryError> {
        if ctx.is_cancelled() {
            return Err(StorageError::Cancelled { operation }.into());
        }
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

fn insert<'a>(state: &'a mut State, user: &NewUser) -> &'a User {
    state.next_id += 1;
    let now = Utc::now();
    let id = state.next_id;
    state.users.entry(id).or_insert(User {
        id,
        email: user.email.clone(),
        name: user.name.clone(),
        created_at: now,
        updated_at: now,
    })
}

fn unique_violation(operation: &'static str) -> RepositoryError {
    StorageError::UniqueViolation {
        operation,
        constraint: Some("users_email_key".to_string()),
    }
    .into()
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, ctx: &RequestContext, user: &NewUser) -> Result<User, RepositoryError> {
        self.check(ctx, "insert user")?;
        let mut state = self.state.lock().unwrap();
        if state.users.values().any(|u| u.email == user.email) {
            return Err(unique_violation("insert user"));
        }
        let created = insert(&mut state, user).clone();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn get_by_id(
        &self,
        ctx: &RequestContext,
        id: i64,
    ) -> Result<Option<User>, RepositoryError> {
        self.check(ctx, "get user by id")?;
        Ok(self.state.lock().unwrap().users.get(&id).cloned())
    }

    async fn get_by_email(
        &self,
        ctx: &RequestContext,
        email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.check(ctx, "get user by email")?;
        if *self.stale_email_lookups.lock().unwrap() {
            return Ok(None);
        }
        let state = self.state.lock().unwrap();
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_all(
        &self,
        ctx: &RequestContext,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<User>, i64), RepositoryError> {
        self.check(ctx, "list users")?;
        let state = self.state.lock().unwrap();
        let page = state
            .users
            .values()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok((page, state.users.len() as i64))
    }

    async fn update(
        &self,
        ctx: &RequestContext,
        id: i64,
        email: &str,
        name: &str,
    ) -> Result<DateTime<Utc>, RepositoryError> {
        self.check(ctx, "update user")?;
        let mut state = self.state.lock().unwrap();
        if state.users.values().any(|u| u.id != id && u.email == email) {
            return Err(unique_violation("update user"));
        }
        let user = state.users.get_mut(&id).ok_or(RepositoryError::NotFound)?;
        user.email = email.to_string();
        user.name = name.to_string();
        user.updated_at = Utc::now();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(user.updated_at)
    }

    async fn delete(&self, ctx: &RequestContext, id: i64) -> Result<(), RepositoryError> {
        self.check(ctx, "delete user")?;
        let mut state = self.state.lock().unwrap();
        state.users.remove(&id).ok_or(RepositoryError::NotFound)?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
