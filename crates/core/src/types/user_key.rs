//! Storage key derived from a customer's email.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::Email;

/// Email with `.` and `@` replaced by `_`, usable as a store path segment.
///
/// ```
/// use sml_market_core::{Email, UserKey};
///
/// let email = Email::parse("test01@gmail.com").unwrap();
/// assert_eq!(UserKey::from_email(&email).as_str(), "test01_gmail_com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    /// Derive the key for an email address.
    #[must_use]
    pub fn from_email(email: &Email) -> Self {
        Self(
            email
                .as_str()
                .chars()
                .map(|c| if matches!(c, '.' | '@') { '_' } else { c })
                .collect(),
        )
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
