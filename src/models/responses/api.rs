//! Generic API response models.

use serde::Serialize;
use utoipa::ToSchema;

/// Error response structure
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Whether the request was successful (always false for errors)
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code
    #[schema(example = "USER_NOT_FOUND")]
    pub code: String,
    /// Error message
    #[schema(example = "user not found")]
    pub message: String,
    /// Field-level validation messages (validation failures only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    /// Request id, also returned in the `X-Request-ID` header
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "7f9c2ba4-e88f-4f3c-9d3b-2b5a3f6c1e7d")]
    pub request_id: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status
    #[schema(example = "ok")]
    pub status: String,
    /// Server time as Unix seconds
    #[schema(example = 1735689600)]
    pub timestamp: i64,
}
