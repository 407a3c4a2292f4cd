use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::db::models::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    pub sub: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub exp: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub sub: String,
    /// Unique per issue, so rotated tokens never repeat.
    pub jti: String,
    pub exp: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Invalid,

    #[error("Failed to sign token: {0}")]
    Sign(jsonwebtoken::errors::Error),
}

/// Signing and verification keys for both token kinds (HS256).
#[derive(Clone)]
pub struct TokenKeys {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    pub fn from_config(auth: &AuthConfig) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(auth.access_token_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(auth.access_token_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(auth.refresh_token_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(auth.refresh_token_secret.as_bytes()),
            access_ttl: Duration::minutes(auth.access_token_minutes),
            refresh_ttl: Duration::days(auth.refresh_token_days),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        let claims = AccessClaims {
            sub: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            exp: expiry(self.access_ttl),
        };
        encode(&Header::default(), &claims, &self.access_encoding).map_err(TokenError::Sign)
    }

    pub fn issue_refresh(&self, user_id: &str) -> Result<String, TokenError> {
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: uuid::Uuid::now_v7().to_string(),
            exp: expiry(self.refresh_ttl),
        };
        encode(&Header::default(), &claims, &self.refresh_encoding).map_err(TokenError::Sign)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        verify(token, &self.access_decoding)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        verify(token, &self.refresh_decoding)
    }
}

fn expiry(ttl: Duration) -> usize {
    (Utc::now() + ttl).timestamp().max(0) as usize
}

fn verify<T: serde::de::DeserializeOwned>(token: &str, key: &DecodingKey) -> Result<T, TokenError> {
    decode::<T>(token, key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid,
        })
}
