//! Username validation
//!
//! Pure checks applied before a username is accepted. Rules run in order and
//! stop at the first failure:
//! 1. non-empty
//! 2. 3 to 20 characters
//! 3. only ASCII letters, digits, `_` and `.`
//! 4. no denylisted term as a case-insensitive substring

use serde::{Deserialize, Serialize};

/// Minimum username length in characters
pub const USERNAME_MIN_LEN: usize = 3;

/// Maximum username length in characters
pub const USERNAME_MAX_LEN: usize = 20;

/// Terms that may not appear anywhere in a username (lowercase)
const DENYLIST: &[&str] = &[
    "admin",
    "administrator",
    "moderator",
    "encore",
    "official",
    "support",
    "staff",
    "system",
    "root",
    "spotify",
    "fuck",
    "shit",
    "bitch",
    "cunt",
    "nazi",
];

/// Result of validating a username
///
/// Serializes as `{"valid": true}` or `{"valid": false, "error": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameValidation {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UsernameValidation {
    fn ok() -> Self {
        Self {
            valid: true,
            error: None,
        }
    }

    fn fail(message: &str) -> Self {
        Self {
            valid: false,
            error: Some(message.to_string()),
        }
    }
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Validate a candidate username
pub fn validate_username(username: &str) -> UsernameValidation {
    if username.is_empty() {
        return UsernameValidation::fail("Username is required");
    }

    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return UsernameValidation::fail("Username must be between 3 and 20 characters");
    }

    if !username.chars().all(is_allowed_char) {
        return UsernameValidation::fail(
            "Username can only contain letters, numbers, underscores, and periods",
        );
    }

    // Message must not reveal which term matched
    let lowered = username.to_ascii_lowercase();
    if DENYLIST.iter().any(|term| lowered.contains(term)) {
        return UsernameValidation::fail("Username contains disallowed terms");
    }

    UsernameValidation::ok()
}
