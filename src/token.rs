use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::models::user::TokenClaims;

/// Lifetime of every access token.
pub const ACCESS_TOKEN_TTL_MINUTES: i64 = 15;

pub fn access_token_ttl() -> Duration {
    Duration::minutes(ACCESS_TOKEN_TTL_MINUTES)
}

pub trait TokenSigner: Send + Sync {
    fn sign(&self, claims: &TokenClaims) -> Result<String, jsonwebtoken::errors::Error>;
}

/// HS256 signer keyed with the configured secret.
#[derive(Clone)]
pub struct JwtSigner {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtSigner {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Decode a token, checking signature and expiry.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<TokenClaims>(token, &self.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, claims: &TokenClaims) -> Result<String, jsonwebtoken::errors::Error> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
    }
}

/// Claims for `user_id` valid from now until now + [`access_token_ttl`].
pub fn claims_for(user_id: i64, email: &str) -> TokenClaims {
    let issued_at = Utc::now();
    let expires_at = issued_at + access_token_ttl();

    TokenClaims {
        sub: user_id,
        email: email.to_owned(),
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    }
}
