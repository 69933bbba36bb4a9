//! User-related normalization rules.

/// Canonical form of an email address, used as the uniqueness key: surrounding
/// whitespace removed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
