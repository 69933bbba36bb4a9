//! Request extension trait for reading values set by middleware.

use actix_web::HttpMessage;

use super::RequestId;

/// Extension trait for reading the request id assigned by
/// [`RequestIdMiddleware`](super::RequestIdMiddleware).
pub trait RequestExt {
    /// Returns `None` when the middleware is not mounted.
    fn request_id(&self) -> Option<String>;
}

impl RequestExt for actix_web::HttpRequest {
    fn request_id(&self) -> Option<String> {
        self.extensions().get::<RequestId>().map(|id| id.0.clone())
    }
}
