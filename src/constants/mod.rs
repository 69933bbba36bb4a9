//! Application constants module.
//!
//! Centralizes the error messages, machine-readable error codes and
//! pagination bounds used across the layers.

pub mod error_codes;
pub mod errors;
pub mod pagination;

pub use error_codes::*;
pub use errors::*;
pub use pagination::*;
