//! User CRUD handlers.

use actix_web::{web, HttpRequest, HttpResponse};
use log::debug;
use utoipa::IntoParams;

use crate::constants::{DEFAULT_OFFSET, DEFAULT_PAGE_SIZE};
use crate::context::RequestContext;
use crate::errors::ApiError;
use crate::models::{CreateUserRequest, UpdateUserRequest};
use crate::services::UserService;
use crate::validators::validation_errors_to_api_error;

/// Raw pagination query. Values that do not parse as integers fall back to the
/// defaults instead of rejecting the request.
#[derive(Debug, Default, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    /// Page size (default: 10, max: 100)
    pub limit: Option<String>,
    /// Rows to skip (default: 0)
    pub offset: Option<String>,
}

impl UserListQuery {
    /// Lenient parse of a raw query string: the first occurrence of each key
    /// wins and a malformed string yields no values.
    pub fn from_query_string(query: &str) -> Self {
        let pairs = web::Query::<Vec<(String, String)>>::from_query(query)
            .map(web::Query::into_inner)
            .unwrap_or_default();
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value.clone())
        };

        Self {
            limit: first("limit"),
            offset: first("offset"),
        }
    }

    fn limit(&self) -> i64 {
        parse_or(self.limit.as_deref(), DEFAULT_PAGE_SIZE)
    }

    fn offset(&self) -> i64 {
        parse_or(self.offset.as_deref(), DEFAULT_OFFSET)
    }
}

fn parse_or(value: Option<&str>, default: i64) -> i64 {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = crate::models::User),
        (status = 400, description = "Invalid body or validation failure", body = crate::models::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::models::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::models::ErrorResponse)
    )
)]
pub async fn create_user(
    user_service: web::Data<dyn UserService>,
    ctx: RequestContext,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let new_user = body
        .into_inner()
        .validated()
        .map_err(validation_errors_to_api_error)?;

    let user = user_service.create_user(&ctx, new_user).await?;
    Ok(HttpResponse::Created().json(user))
}

/// List users ordered by id
#[utoipa::path(
    get,
    path = "/api/v1/users",
    tag = "Users",
    params(UserListQuery),
    responses(
        (status = 200, description = "One page of users", body = crate::models::PaginationResult),
        (status = 500, description = "Internal server error", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_users(
    user_service: web::Data<dyn UserService>,
    ctx: RequestContext,
    req: HttpRequest,
) -> Result<HttpResponse, ApiError> {
    let query = UserListQuery::from_query_string(req.query_string());
    let page = user_service
        .get_users(&ctx, query.limit(), query.offset())
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = crate::models::User),
        (status = 400, description = "Invalid user ID", body = crate::models::ErrorResponse),
        (status = 404, description = "User not found", body = crate::models::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_user(
    user_service: web::Data<dyn UserService>,
    ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    debug!("[{}] Fetching user with id: {}", ctx.request_id(), id);

    let user = user_service.get_user(&ctx, id).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Update a user's email and/or name
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = crate::models::User),
        (status = 400, description = "Invalid user ID, body or validation failure", body = crate::models::ErrorResponse),
        (status = 404, description = "User not found", body = crate::models::ErrorResponse),
        (status = 409, description = "Email already in use", body = crate::models::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::models::ErrorResponse)
    )
)]
pub async fn update_user(
    user_service: web::Data<dyn UserService>,
    ctx: RequestContext,
    path: web::Path<i64>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let changes = body
        .into_inner()
        .validated()
        .map_err(validation_errors_to_api_error)?;

    let user = user_service.update_user(&ctx, id, changes).await?;
    Ok(HttpResponse::Ok().json(user))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    tag = "Users",
    params(
        ("id" = i64, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid user ID", body = crate::models::ErrorResponse),
        (status = 404, description = "User not found", body = crate::models::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::models::ErrorResponse)
    )
)]
pub async fn delete_user(
    user_service: web::Data<dyn UserService>,
    ctx: RequestContext,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    user_service.delete_user(&ctx, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unparsable_paging_falls_back_to_defaults() {
        let query = UserListQuery {
            limit: Some("ten".to_string()),
            offset: None,
        };
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.offset(), DEFAULT_OFFSET);
    }

    #[test]
    fn test_numeric_paging_passes_through_unclamped() {
        let query = UserListQuery {
            limit: Some(" 500 ".to_string()),
            offset: Some("-3".to_string()),
        };
        assert_eq!(query.limit(), 500);
        assert_eq!(query.offset(), -3);
    }

    #[test]
    fn test_duplicate_keys_use_first_value() {
        let query = UserListQuery::from_query_string("limit=5&limit=6&offset=2");
        assert_eq!(query.limit(), 5);
        assert_eq!(query.offset(), 2);
    }

    #[test]
    fn test_malformed_query_string_yields_defaults() {
        let query = UserListQuery::from_query_string("limit=%zz&&=offset");
        assert_eq!(query.offset(), DEFAULT_OFFSET);
        assert!(UserListQuery::from_query_string("").limit.is_none());
    }
}
