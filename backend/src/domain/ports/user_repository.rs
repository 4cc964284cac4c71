//! Driven port for accounts, registrations and password resets.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::StoreError;
use crate::domain::{Credentials, PasswordResetToken, User, UserId, UserRegistration};

/// Persistence contract for user accounts and their one-time tokens.
///
/// Tokens are generated by the store. Each account holds at most one
/// registration and one password reset; issuing another replaces it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert an unconfirmed account. A taken email is a
    /// [`StoreError::Conflict`].
    async fn create_user(&self, credentials: &Credentials) -> Result<User, StoreError>;

    /// Fetch an account by id.
    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError>;

    /// Fetch an account by its email.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Persist a changed email or confirmation flag.
    async fn update_user(&self, user: &User) -> Result<(), StoreError>;

    /// Issue a registration token for `user`.
    async fn create_user_registration(&self, user: &User)
    -> Result<UserRegistration, StoreError>;

    /// Look up a registration, with its account, by token.
    async fn get_registration_by_token(&self, token: &str)
    -> Result<UserRegistration, StoreError>;

    /// Drop the registration of `user`.
    async fn delete_registration_by_user(&self, user: UserId) -> Result<(), StoreError>;

    /// Drop registrations issued before `before`; returns how many went.
    async fn delete_registrations_before(&self, before: DateTime<Utc>)
    -> Result<usize, StoreError>;

    /// Issue a password reset token for `user`.
    async fn create_password_reset_token(
        &self,
        user: &User,
    ) -> Result<PasswordResetToken, StoreError>;

    /// The outstanding password reset of `user`.
    async fn get_password_reset_token_by_user(
        &self,
        user: &User,
    ) -> Result<PasswordResetToken, StoreError>;

    /// Redeem a reset token: store the new hash and drop the token, in one
    /// transaction.
    async fn update_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    /// Drop password resets issued before `before`; returns how many went.
    async fn delete_password_resets_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    /// Create an account and its registration token in one transaction.
    async fn register_user(&self, credentials: &Credentials)
    -> Result<UserRegistration, StoreError>;

    /// Redeem a registration token: confirm the account and drop the
    /// registration in one transaction.
    async fn confirm_user_by_token(&self, token: &str) -> Result<User, StoreError>;
}
