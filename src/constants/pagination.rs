//! Pagination constants for list endpoints.

/// Page size used when the request omits `limit` or asks for an out-of-range value.
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Maximum allowed items per page to prevent excessive data retrieval.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Offset used when the request omits `offset` or sends a negative one.
pub const DEFAULT_OFFSET: i64 = 0;
