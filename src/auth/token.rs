//! Signed, stateless session tokens (HS256 JWTs).
//!
//! A token names exactly one user by opaque id and is valid for
//! [`SESSION_TTL_HOURS`] after it was issued. Nothing is stored server-side.
//!
//! Timestamps are whole Unix seconds on both sides of the check: a token issued
//! at `T` is accepted while `now` truncated to the second is below
//! `floor(T) + 24h`, so the sub-second part of `T` is not counted.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SESSION_TTL_HOURS;
use crate::core::errors::ApiError;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Opaque user id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: &str, issued_at: DateTime<Utc>) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: user_id.to_string(),
            iat,
            exp: iat + Duration::hours(SESSION_TTL_HOURS).num_seconds(),
        }
    }

    /// Second-granularity, like `iat` and `exp`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl SessionKeys {
    pub fn new(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against the caller's clock in `verify`
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn mint(&self, user_id: &str, issued_at: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = Claims::new(user_id, issued_at);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ApiError::Internal(format!("failed to sign session token: {}", e)))
    }

    /// Checks signature and expiry. Malformed and expired tokens fail differently.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, ApiError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|_| ApiError::InvalidToken)?;

        if claims.is_expired_at(now) {
            return Err(ApiError::SessionExpired);
        }
        Ok(claims)
    }
}
