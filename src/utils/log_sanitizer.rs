//! Masking of personal data before it reaches the logs.

const VISIBLE_CHARS: usize = 3;

/// Mask an email address for logging: the first three characters of the local
/// part stay visible, the domain is kept.
///
/// # Examples
/// ```ignore
/// assert_eq!(mask_email("user@example.com"), "use***@example.com");
/// assert_eq!(mask_email("ab@test.org"), "ab***@test.org");
/// ```
pub fn mask_email(email: &str) -> String {
    let (local_part, domain) = match email.find('@') {
        Some(at_pos) => email.split_at(at_pos),
        None => (email, ""),
    };
    let visible: String = local_part.chars().take(VISIBLE_CHARS).collect();
    format!("{}***{}", visible, domain)
}
