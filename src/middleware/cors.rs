use actix_cors::Cors;
use actix_web::http::{header, Method};

/// CORS policy from a comma-separated origin list; `*` allows any origin.
pub fn build_cors(origins: &str) -> Cors {
    let cors = Cors::default()
        .allowed_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
        ])
        .allowed_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
        .max_age(3600);

    let origins: Vec<&str> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .collect();

    if origins.is_empty() || origins.contains(&"*") {
        return cors.allow_any_origin();
    }
    origins
        .into_iter()
        .fold(cors, |cors, origin| cors.allowed_origin(origin))
}
