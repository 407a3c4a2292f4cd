use axum::http::{header, HeaderMap};
use serde::Serialize;

use super::tokens::{TokenError, TokenKeys};
use crate::config::AuthConfig;
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::repo::{RepoError, UserRepository};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, verifies, rotates and revokes session tokens. The only place that
/// formats session cookies.
#[derive(Clone)]
pub struct SessionService {
    keys: TokenKeys,
    users: UserRepository,
    secure_cookies: bool,
}

impl SessionService {
    pub fn new(auth: &AuthConfig, users: UserRepository) -> Self {
        Self {
            keys: TokenKeys::from_config(auth),
            users,
            secure_cookies: auth.secure_cookies,
        }
    }

    /// New token pair for `user`. The refresh token replaces any stored one.
    pub fn issue(&self, user: &User) -> AppResult<TokenPair> {
        let access_token = self.keys.issue_access(user)?;
        let refresh_token = self.keys.issue_refresh(&user.id)?;
        self.users.set_refresh_token(&user.id, Some(&refresh_token))?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Resolve an access token to its user.
    pub fn authenticate(&self, access_token: &str) -> AppResult<User> {
        let claims = self.keys.verify_access(access_token)?;
        self.users.find_by_id(&claims.sub).map_err(|e| match e {
            RepoError::NotFound(_) => AppError::unauthenticated("Invalid access token"),
            other => other.into(),
        })
    }

    /// Trade a refresh token for a new pair. Only the most recently issued
    /// refresh token is accepted.
    pub fn rotate(&self, refresh_token: &str) -> AppResult<(User, TokenPair)> {
        let claims = self.keys.verify_refresh(refresh_token)?;
        let user = self.users.find_by_id(&claims.sub).map_err(|e| match e {
            RepoError::NotFound(_) => AppError::unauthenticated("Invalid refresh token"),
            other => other.into(),
        })?;
        let access_token = self.keys.issue_access(&user)?;
        let next = self.keys.issue_refresh(&user.id)?;
        if !self
            .users
            .swap_refresh_token(&user.id, refresh_token, &next)?
        {
            return Err(AppError::unauthenticated(
                "Refresh token is expired or used",
            ));
        }
        Ok((
            user,
            TokenPair {
                access_token,
                refresh_token: next,
            },
        ))
    }

    pub fn revoke(&self, user_id: &str) -> AppResult<()> {
        self.users.set_refresh_token(user_id, None)?;
        Ok(())
    }

    /// `Set-Cookie` values for both tokens.
    pub fn cookies(&self, pair: &TokenPair) -> [(header::HeaderName, String); 2] {
        [
            (
                header::SET_COOKIE,
                self.cookie(
                    ACCESS_COOKIE,
                    &pair.access_token,
                    self.keys.access_ttl().num_seconds(),
                ),
            ),
            (
                header::SET_COOKIE,
                self.cookie(
                    REFRESH_COOKIE,
                    &pair.refresh_token,
                    self.keys.refresh_ttl().num_seconds(),
                ),
            ),
        ]
    }

    /// `Set-Cookie` values that expire both tokens.
    pub fn clear_cookies(&self) -> [(header::HeaderName, String); 2] {
        [
            (header::SET_COOKIE, self.cookie(ACCESS_COOKIE, "", 0)),
            (header::SET_COOKIE, self.cookie(REFRESH_COOKIE, "", 0)),
        ]
    }

    fn cookie(&self, name: &str, value: &str, max_age_secs: i64) -> String {
        let secure = if self.secure_cookies { "; Secure" } else { "" };
        format!("{name}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age_secs}{secure}")
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::unauthenticated("Token has expired"),
            TokenError::Invalid => AppError::unauthenticated("Invalid token"),
            TokenError::Sign(e) => AppError::Internal(format!("token signing failed: {e}")),
        }
    }
}

pub fn get_cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name && !val.is_empty() {
                Some(val)
            } else {
                None
            }
        })
}

/// Access token from the cookie, else from `Authorization: Bearer`.
pub fn access_token_from_headers(headers: &HeaderMap) -> Option<&str> {
    get_cookie_value(headers, ACCESS_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}
