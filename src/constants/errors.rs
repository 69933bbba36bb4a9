//! Error message constants used throughout the application.

// User errors
pub const ERR_USER_NOT_FOUND: &str = "user not found";
pub const ERR_EMAIL_EXISTS: &str = "email already exists";
pub const ERR_EMAIL_IN_USE: &str = "email already in use";

// Request errors
pub const ERR_INVALID_USER_ID: &str = "Invalid user ID";
pub const ERR_INVALID_BODY: &str = "Invalid request body";
pub const ERR_RATE_LIMITED: &str = "Rate limit exceeded";
pub const ERR_REQUEST_FAILED: &str = "Request failed";

// Server errors
pub const ERR_INTERNAL: &str = "Internal server error";
