//! Pagination response models.

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::User;

/// One page of users ordered by ascending id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PaginationResult {
    /// Users on this page
    pub users: Vec<User>,
    /// Total number of users, not just this page
    pub total: i64,
    /// Effective page size after clamping
    pub limit: i64,
    /// Effective offset after clamping
    pub offset: i64,
    /// `ceil(total / limit)`
    pub total_pages: i64,
}

impl PaginationResult {
    pub fn new(users: Vec<User>, total: i64, limit: i64, offset: i64) -> Self {
        Self {
            users,
            total,
            limit,
            offset,
            total_pages: total_pages(total, limit),
        }
    }
}

/// Ceiling division of `total` by a positive `limit`.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 || total <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}
