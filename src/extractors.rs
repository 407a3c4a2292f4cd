use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::session::access_token_from_headers;
use crate::db::models::User;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated caller. Rejects with 401 before the handler runs when
/// the access token is missing, invalid, expired or names no user.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn id(&self) -> &str {
        &self.0.id
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = access_token_from_headers(&parts.headers)
            .ok_or_else(|| AppError::unauthenticated("Unauthorized request"))?;
        let user = state.sessions.authenticate(token)?;
        Ok(CurrentUser(user))
    }
}

/// Optional user extractor, `None` instead of 401 when not authenticated.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

impl MaybeUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_ref().map(|u| u.id.as_str())
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(CurrentUser(user)) => Ok(MaybeUser(Some(user))),
            Err(AppError::Unauthenticated(_)) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Ownership guard for mutations: the caller must be the recorded owner.
pub fn ensure_owner(user: &CurrentUser, owner_id: &str, what: &str) -> Result<(), AppError> {
    if user.id() == owner_id {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Only the owner can modify this {what}"
        )))
    }
}

/// Path ids must be UUIDs in the stored form: hyphenated, lowercase.
pub fn parse_id<'a>(raw: &'a str, what: &str) -> Result<&'a str, AppError> {
    match uuid::Uuid::parse_str(raw) {
        Ok(id) if id.hyphenated().to_string() == raw => Ok(raw),
        _ => Err(AppError::validation(format!("Invalid {what} id"))),
    }
}
