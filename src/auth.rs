//! Sign-up, sign-in and access token issuance.

use thiserror::Error;

use crate::{
    models::user::{AccessToken, Credentials},
    password,
    store::{PendingUser, StoreError, UserStore},
    token::{self, TokenSigner},
};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Credential taken")]
    CredentialConflict,
    /// Shared by unknown email and wrong password.
    #[error("Invalid Credentials")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Persistence(#[from] sqlx::Error),
    #[error("password hash error: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    #[error("token signing error: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
    #[error("hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

fn registration_error(e: StoreError) -> AuthError {
    match e {
        StoreError::DuplicateKey => {
            tracing::info!("registration rejected, email already on file");
            AuthError::CredentialConflict
        }
        StoreError::Database(e) => AuthError::Persistence(e),
    }
}

pub struct CredentialAuthenticator<S, T> {
    store: S,
    signer: T,
}

impl<S, T> CredentialAuthenticator<S, T>
where
    S: UserStore,
    T: TokenSigner,
{
    pub fn new(store: S, signer: T) -> Self {
        Self { store, signer }
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &S {
        &self.store
    }

    #[cfg(test)]
    pub(crate) fn signer(&self) -> &T {
        &self.signer
    }

    /// The user row and the token are one unit: the row is committed only
    /// once the token has been signed.
    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn register_user(&self, credentials: Credentials) -> Result<AccessToken, AuthError> {
        let Credentials { email, password } = credentials;
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password(&password)).await??;

        let pending = self
            .store
            .create_user(&email, &password_hash)
            .await
            .map_err(registration_error)?;

        let (user_id, email) = (pending.user().id, pending.user().email.clone());
        // On error `pending` is dropped here and the insert rolls back.
        let token = self.issue_token(user_id, &email)?;
        pending.commit().await.map_err(registration_error)?;

        tracing::info!(user_id, "user registered");
        Ok(token)
    }

    #[tracing::instrument(skip_all, fields(email = %credentials.email))]
    pub async fn authenticate_user(
        &self,
        credentials: Credentials,
    ) -> Result<AccessToken, AuthError> {
        let Some(user) = self.store.find_user_by_email(&credentials.email).await? else {
            tracing::debug!("sign-in for unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let password = credentials.password;
        let stored_hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || {
            password::verify_password(&password, &stored_hash)
        })
        .await??;

        if !matches {
            tracing::debug!(user_id = user.id, "sign-in with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_token(user.id, &user.email)
    }

    pub fn issue_token(&self, user_id: i64, email: &str) -> Result<AccessToken, AuthError> {
        let claims = token::claims_for(user_id, email);
        let access_token = self.signer.sign(&claims)?;
        Ok(AccessToken { access_token })
    }
}
