//! Repository layer for database operations.
//!
//! Services depend on the [`UserRepository`] trait; [`PgUserRepository`] is the
//! PostgreSQL implementation.

#[cfg(test)]
pub mod memory;
pub mod user_repository;

pub use user_repository::{PgUserRepository, UserRepository};
