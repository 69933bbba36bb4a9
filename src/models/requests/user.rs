//! User-related request models.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::models::{NewUser, UserChanges};
use crate::validators::normalize_email;

/// Request payload for creating a user
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Email address, unique across users (max 255 characters)
    #[validate(
        required(message = "is required"),
        email(message = "must be valid email"),
        length(max = 255, message = "must not exceed 255 characters")
    )]
    #[schema(example = "user@example.com")]
    pub email: Option<String>,
    /// Display name (2-255 characters)
    #[validate(
        required(message = "is required"),
        length(min = 2, max = 255, message = "must be between 2 and 255 characters")
    )]
    #[schema(example = "Jane Doe")]
    pub name: Option<String>,
}

/// Request payload for updating a user.
///
/// Omitted (or `null`) fields are left unchanged; fields that are present must
/// satisfy the same rules as on creation.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUserRequest {
    /// New email address
    #[validate(
        email(message = "must be valid email"),
        length(max = 255, message = "must not exceed 255 characters")
    )]
    #[schema(example = "new.email@example.com")]
    pub email: Option<String>,
    /// New display name
    #[validate(length(min = 2, max = 255, message = "must be between 2 and 255 characters"))]
    #[schema(example = "Jane Smith")]
    pub name: Option<String>,
}

impl CreateUserRequest {
    /// Trim and validate the payload, producing a normalized [`NewUser`].
    pub fn validated(self) -> Result<NewUser, ValidationErrors> {
        let request = Self {
            email: trimmed(self.email),
            name: trimmed(self.name),
        };
        request.validate()?;

        Ok(NewUser {
            email: normalize_email(&request.email.unwrap_or_default()),
            name: request.name.unwrap_or_default(),
        })
    }
}

impl UpdateUserRequest {
    /// Trim and validate the present fields, producing [`UserChanges`].
    pub fn validated(self) -> Result<UserChanges, ValidationErrors> {
        let request = Self {
            email: trimmed(self.email),
            name: trimmed(self.name),
        };
        request.validate()?;

        Ok(UserChanges {
            email: request.email.as_deref().map(normalize_email),
            name: request.name,
        })
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}
