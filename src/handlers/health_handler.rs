//! Liveness and API documentation endpoints.

use actix_web::HttpResponse;
use chrono::Utc;
use utoipa::OpenApi;

use crate::models::HealthResponse;
use crate::openapi::ApiDoc;

/// Liveness probe
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now().timestamp(),
    })
}

/// OpenAPI document for this service.
pub async fn openapi_json() -> HttpResponse {
    HttpResponse::Ok().json(ApiDoc::openapi())
}
