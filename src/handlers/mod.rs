//! HTTP request handlers organized by domain.

pub mod health_handler;
pub mod user_handler;

pub use health_handler::*;
pub use user_handler::*;
