//! Bearer-token extractor for protected routes

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::debug;

use super::jwt;
use crate::core::http::AppState;
use crate::error::ApiError;
use crate::models::user::User;

/// The authenticated caller, resolved from the JWT subject
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("Invalid authorization format".to_string()))?;

        let claims = jwt::verify_token(token, &app_state.auth.jwt_secret).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            ApiError::Unauthorized("Invalid or expired token".to_string())
        })?;

        let user = app_state
            .users
            .find_user_by_username(&claims.sub)
            .await
            .map_err(|e| ApiError::internal("Failed to load user", e))?
            .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))?;

        Ok(AuthUser(user))
    }
}
