//! Services organized by domain concern.

pub mod user_service;

#[cfg(test)]
pub use user_service::MockUserService;
pub use user_service::{UserService, UserServiceImpl};
