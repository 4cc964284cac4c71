//! Accounts, registration tokens and password reset tokens.
//!
//! Tokens are 32 random bytes, hex encoded. An account holds at most one
//! token of each kind: issuing a new one replaces the old token and its
//! issue time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use rand::Rng as _;
use tracing::{debug, instrument};

use super::DieselRecipeStore;
use super::diesel_helpers::{
    map_diesel_error, map_diesel_error_for, map_pool_error, require_affected,
};
use super::models::{
    NewPasswordResetRow, NewRegistrationRow, NewUserRow, PasswordResetRow, RegistrationRow,
    UserChanges, UserRow,
};
use super::schema::{password_resets, user_registrations, users};
use super::transaction::with_transaction;
use crate::domain::ports::{StoreError, UserRepository};
use crate::domain::{Credentials, PasswordResetToken, User, UserId, UserRegistration};

/// Fresh one-time token.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    hex::encode(bytes)
}

async fn insert_user(
    conn: &mut AsyncPgConnection,
    credentials: &Credentials,
) -> Result<User, StoreError> {
    let row: UserRow = diesel::insert_into(users::table)
        .values(&NewUserRow {
            email: &credentials.email,
            password_hash: &credentials.password_hash,
        })
        .returning(UserRow::as_returning())
        .get_result(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(User::from(row))
}

async fn upsert_registration(
    conn: &mut AsyncPgConnection,
    user: &User,
    token: &str,
) -> Result<UserRegistration, StoreError> {
    let row: RegistrationRow = diesel::insert_into(user_registrations::table)
        .values(&NewRegistrationRow {
            user_id: user.id.get(),
            token,
            created_at: Utc::now(),
        })
        .on_conflict(user_registrations::user_id)
        .do_update()
        .set((
            user_registrations::token.eq(excluded(user_registrations::token)),
            user_registrations::created_at.eq(excluded(user_registrations::created_at)),
        ))
        .returning(RegistrationRow::as_returning())
        .get_result(conn)
        .await
        .map_err(map_diesel_error)?;
    Ok(UserRegistration {
        user: user.clone(),
        token: row.token,
        created_at: row.created_at,
    })
}

fn assemble_reset(user: &User, row: PasswordResetRow) -> PasswordResetToken {
    PasswordResetToken {
        user: user.clone(),
        token: row.token,
        created_at: row.created_at,
    }
}

#[async_trait]
impl UserRepository for DieselRecipeStore {
    #[instrument(skip_all)]
    async fn create_user(&self, credentials: &Credentials) -> Result<User, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = insert_user(&mut conn, credentials).await?;
        debug!(user = %user.id, "user created");
        Ok(user)
    }

    async fn get_user_by_id(&self, id: UserId) -> Result<User, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: UserRow = users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| format!("user {id}")))?;
        Ok(User::from(row))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: UserRow = users::table
            .filter(users::email.eq(email))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| "user".to_owned()))?;
        Ok(User::from(row))
    }

    #[instrument(skip_all, fields(user = %user.id))]
    async fn update_user(&self, user: &User) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::update(users::table.find(user.id.get()))
            .set(UserChanges::from(user))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        require_affected(affected, || format!("user {}", user.id))
    }

    #[instrument(skip_all, fields(user = %user.id))]
    async fn create_user_registration(
        &self,
        user: &User,
    ) -> Result<UserRegistration, StoreError> {
        let token = generate_token();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        upsert_registration(&mut conn, user, &token).await
    }

    async fn get_registration_by_token(
        &self,
        token: &str,
    ) -> Result<UserRegistration, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (registration, user): (RegistrationRow, UserRow) = user_registrations::table
            .inner_join(users::table)
            .filter(user_registrations::token.eq(token))
            .select((RegistrationRow::as_select(), UserRow::as_select()))
            .first(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| "registration".to_owned()))?;
        Ok(UserRegistration {
            user: User::from(user),
            token: registration.token,
            created_at: registration.created_at,
        })
    }

    #[instrument(skip(self))]
    async fn delete_registration_by_user(&self, user: UserId) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let affected = diesel::delete(
            user_registrations::table.filter(user_registrations::user_id.eq(user.get())),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        require_affected(affected, || format!("registration of user {user}"))
    }

    #[instrument(skip(self))]
    async fn delete_registrations_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(
            user_registrations::table.filter(user_registrations::created_at.lt(before)),
        )
        .execute(&mut conn)
        .await
        .map_err(map_diesel_error)?;
        debug!(removed, "stale registrations removed");
        Ok(removed)
    }

    #[instrument(skip_all, fields(user = %user.id))]
    async fn create_password_reset_token(
        &self,
        user: &User,
    ) -> Result<PasswordResetToken, StoreError> {
        let token = generate_token();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: PasswordResetRow = diesel::insert_into(password_resets::table)
            .values(&NewPasswordResetRow {
                user_id: user.id.get(),
                token: &token,
                created_at: Utc::now(),
            })
            .on_conflict(password_resets::user_id)
            .do_update()
            .set((
                password_resets::token.eq(excluded(password_resets::token)),
                password_resets::created_at.eq(excluded(password_resets::created_at)),
            ))
            .returning(PasswordResetRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(assemble_reset(user, row))
    }

    async fn get_password_reset_token_by_user(
        &self,
        user: &User,
    ) -> Result<PasswordResetToken, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: PasswordResetRow = password_resets::table
            .find(user.id.get())
            .select(PasswordResetRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error_for(|| {
                format!("password reset of user {}", user.id)
            }))?;
        Ok(assemble_reset(user, row))
    }

    #[instrument(skip_all)]
    async fn update_password_by_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_id = with_transaction(&mut *conn, |tx| {
            async move {
                let user_id: i64 = password_resets::table
                    .filter(password_resets::token.eq(token))
                    .select(password_resets::user_id)
                    .first(tx)
                    .await
                    .map_err(map_diesel_error_for(|| "password reset token".to_owned()))?;
                let updated = diesel::update(users::table.find(user_id))
                    .set(users::password_hash.eq(password_hash))
                    .execute(tx)
                    .await
                    .map_err(map_diesel_error)?;
                require_affected(updated, || format!("user {user_id}"))?;
                diesel::delete(password_resets::table.filter(password_resets::user_id.eq(user_id)))
                    .execute(tx)
                    .await
                    .map_err(map_diesel_error)?;
                Ok::<_, StoreError>(user_id)
            }
            .scope_boxed()
        })
        .await?;
        debug!(user = user_id, "password updated");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete_password_resets_before(
        &self,
        before: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed =
            diesel::delete(password_resets::table.filter(password_resets::created_at.lt(before)))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
        debug!(removed, "stale password resets removed");
        Ok(removed)
    }

    #[instrument(skip_all)]
    async fn register_user(
        &self,
        credentials: &Credentials,
    ) -> Result<UserRegistration, StoreError> {
        let token = generate_token();
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let registration = with_transaction(&mut *conn, |tx| {
            async move {
                let user = insert_user(tx, credentials).await?;
                upsert_registration(tx, &user, &token).await
            }
            .scope_boxed()
        })
        .await?;
        debug!(user = %registration.user.id, "user registered");
        Ok(registration)
    }

    #[instrument(skip_all)]
    async fn confirm_user_by_token(&self, token: &str) -> Result<User, StoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user = with_transaction(&mut *conn, |tx| {
            async move {
                let user_id: i64 = user_registrations::table
                    .filter(user_registrations::token.eq(token))
                    .select(user_registrations::user_id)
                    .first(tx)
                    .await
                    .map_err(map_diesel_error_for(|| "registration".to_owned()))?;
                let row: UserRow = diesel::update(users::table.find(user_id))
                    .set(users::is_confirmed.eq(true))
                    .returning(UserRow::as_returning())
                    .get_result(tx)
                    .await
                    .map_err(map_diesel_error_for(|| format!("user {user_id}")))?;
                diesel::delete(
                    user_registrations::table.filter(user_registrations::user_id.eq(user_id)),
                )
                .execute(tx)
                .await
                .map_err(map_diesel_error)?;
                Ok::<_, StoreError>(User::from(row))
            }
            .scope_boxed()
        })
        .await?;
        debug!(user = %user.id, "user confirmed");
        Ok(user)
    }
}
