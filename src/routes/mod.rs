use actix_web::{error, web, HttpRequest};
use log::debug;

use crate::constants::{ERR_INVALID_BODY, ERR_INVALID_USER_ID};
use crate::errors::ApiError;
use crate::handlers;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .route("/health", web::get().to(handlers::health_check))
        .route("/api-docs/openapi.json", web::get().to(handlers::openapi_json))
        .service(
            web::scope("/api/v1/users")
                .route("", web::post().to(handlers::create_user))
                .route("", web::get().to(handlers::get_users))
                .route("/{id}", web::get().to(handlers::get_user))
                .route("/{id}", web::put().to(handlers::update_user))
                .route("/{id}", web::delete().to(handlers::delete_user)),
        );
}

fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected request body: {}", err);
    ApiError::BadRequest(ERR_INVALID_BODY.to_string()).into()
}

fn path_error_handler(err: error::PathError, _req: &HttpRequest) -> actix_web::Error {
    debug!("Rejected path parameter: {}", err);
    ApiError::BadRequest(ERR_INVALID_USER_ID.to_string()).into()
}
