//! HTTP middleware and request helpers.

pub mod cors;
pub mod rate_limiter;
pub mod request_ext;
pub mod request_id;

pub use cors::build_cors;
pub use rate_limiter::build_rate_limiter_config;
pub use request_ext::RequestExt;
pub use request_id::{RequestId, RequestIdMiddleware};
