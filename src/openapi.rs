use utoipa::OpenApi;

use crate::models::{
    CreateUserRequest, ErrorResponse, HealthResponse, PaginationResult, UpdateUserRequest, User,
};

/// OpenAPI documentation for the Users API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "1.0.0",
        description = "CRUD service for user records (email and display name) backed by PostgreSQL.",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Users", description = "User management endpoints")
    ),
    paths(
        crate::handlers::create_user,
        crate::handlers::get_users,
        crate::handlers::get_user,
        crate::handlers::update_user,
        crate::handlers::delete_user,
        crate::handlers::health_check
    ),
    components(
        schemas(
            CreateUserRequest,
            UpdateUserRequest,
            User,
            PaginationResult,
            ErrorResponse,
            HealthResponse
        )
    )
)]
pub struct ApiDoc;
