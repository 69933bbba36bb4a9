//! Common validation utilities and helpers.

use validator::ValidationErrors;

use crate::errors::ApiError;

/// Convert validator errors to `ApiError::ValidationError`.
///
/// Each entry reads `"<field>: <message>"`; entries are sorted so responses
/// are stable regardless of map iteration order.
///
/// # Example
/// ```ignore
/// let new_user = body.into_inner().validated().map_err(validation_errors_to_api_error)?;
/// ```
pub fn validation_errors_to_api_error(e: ValidationErrors) -> ApiError {
    let mut errors: Vec<String> = e
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();
    errors.sort();
    ApiError::ValidationError(errors)
}
