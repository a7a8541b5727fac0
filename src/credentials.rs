use std::time::{SystemTime, UNIX_EPOCH};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::AppError};

/// Claims
///
/// Payload of the bearer tokens issued at register/login. The subject is the username,
/// which the `AuthUser` extractor resolves back to an account on every request.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the username the token was issued to.
    pub sub: String,
    /// Expiration Time (exp): seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat): seconds since the epoch.
    pub iat: usize,
}

/// Credentials
///
/// The credential service: Argon2id password hashing and HS256 token issuance.
/// The forum core never sees raw passwords beyond this type.
#[derive(Clone)]
pub struct Credentials {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_secs: u64,
}

impl Credentials {
    pub fn new(jwt_secret: &str, token_ttl_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_ttl_secs,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.jwt_secret, config.jwt_ttl_secs)
    }

    /// Hashes a password into a PHC string with a fresh random salt.
    pub fn hash_password(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| {
                tracing::error!("password hashing failed: {}", e);
                AppError::Internal("password hashing failed".to_string())
            })
    }

    /// Checks a password against a stored PHC hash. A malformed hash never matches.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Issues a signed bearer token for `username`.
    pub fn issue_token(&self, username: &str) -> Result<String, AppError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AppError::Internal("system clock before epoch".to_string()))?
            .as_secs();
        let claims = Claims {
            sub: username.to_string(),
            iat: now as usize,
            exp: (now + self.token_ttl_secs) as usize,
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("token signing failed: {}", e);
            AppError::Internal("token signing failed".to_string())
        })
    }

    /// Validates signature and expiry and returns the claims.
    pub fn decode_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        decode::<Claims>(token, &self.decoding_key, &validation).map(|data| data.claims)
    }
}
