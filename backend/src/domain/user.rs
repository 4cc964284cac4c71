//! User accounts and the one-time tokens attached to them.
//!
//! Passwords arrive already hashed; hashing, email delivery and token expiry
//! scheduling belong to the callers. The store persists accounts and hands
//! out registration and password reset tokens.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database identifier of a user account.
///
/// # Examples
/// ```
/// use recipe_manager::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw database id.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Access the raw database id.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for UserId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Email and password hash supplied at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login email; unique across accounts.
    pub email: String,
    /// Password hash produced by the authentication layer.
    pub password_hash: String,
}

impl Credentials {
    /// Trim and lowercase the email so lookups ignore case.
    pub fn normalised(&self) -> Self {
        Self {
            email: normalise_email(&self.email),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Canonical form of an email address for storage and lookup.
///
/// # Examples
/// ```
/// use recipe_manager::domain::user::normalise_email;
///
/// assert_eq!(normalise_email("  Ada@Example.ORG "), "ada@example.org");
/// ```
pub fn normalise_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Database id.
    pub id: UserId,
    /// Login email.
    pub email: String,
    /// Stored password hash; never serialised.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Whether the registration token has been redeemed.
    pub confirmed: bool,
}

/// Pending confirmation of a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRegistration {
    /// The account awaiting confirmation.
    pub user: User,
    /// Token the user presents to confirm.
    pub token: String,
    /// Issue time, used to expire stale registrations.
    pub created_at: DateTime<Utc>,
}

/// Outstanding password reset for an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetToken {
    /// The account being reset.
    pub user: User,
    /// Token the user presents with the new password.
    pub token: String,
    /// Issue time, used to expire stale resets.
    pub created_at: DateTime<Utc>,
}
