//! Email/password sign-up and sign-in issuing short-lived HS256 access tokens.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod password;
pub mod rest;
pub mod store;
pub mod token;

use std::sync::Arc;

use auth::CredentialAuthenticator;
use store::SqliteUserStore;
use token::JwtSigner;

pub type Authenticator = CredentialAuthenticator<SqliteUserStore, JwtSigner>;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<Authenticator>,
}

impl AppState {
    pub fn new(store: SqliteUserStore, signer: JwtSigner) -> Self {
        Self {
            auth: Arc::new(CredentialAuthenticator::new(store, signer)),
        }
    }
}
