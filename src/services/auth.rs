//! Account registration and login

use serde::Deserialize;
use tracing::{info, warn};

use crate::auth::{jwt, password};
use crate::core::http::AppState;
use crate::error::{ApiError, ApiResult};
use crate::models::user::USERNAME_MAX_LEN;

const CREDENTIALS_REQUIRED: &str = "Username and password are required";

#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl Credentials {
    /// Lenient parse: anything that is not an object of strings yields empty
    /// credentials, which are then rejected as missing.
    pub fn from_body(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    fn required(self) -> ApiResult<(String, String)> {
        match (self.username, self.password) {
            (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
                if username.chars().count() > USERNAME_MAX_LEN {
                    return Err(ApiError::BadRequest(format!(
                        "Username must be at most {} characters",
                        USERNAME_MAX_LEN
                    )));
                }
                Ok((username, password))
            }
            _ => Err(ApiError::BadRequest(CREDENTIALS_REQUIRED.to_string())),
        }
    }
}

pub async fn register(state: &AppState, credentials: Credentials) -> ApiResult<i64> {
    let (username, password) = credentials.required()?;

    let existing = state
        .users
        .find_user_by_username(&username)
        .await
        .map_err(|e| ApiError::internal("Failed to look up user", e))?;
    if existing.is_some() {
        return Err(ApiError::BadRequest("Username already exists".to_string()));
    }

    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| ApiError::internal("Password hashing task failed", e))?
        .map_err(|e| ApiError::internal("Failed to hash password", e))?;

    let user_id = state
        .users
        .create_user(&username, &password_hash)
        .await
        .map_err(|e| ApiError::internal("Failed to create user", e))?
        .ok_or_else(|| ApiError::BadRequest("Username already exists".to_string()))?;

    info!(user_id = user_id, username = %username, "User registered");
    Ok(user_id)
}

/// Check the credentials and issue an access token
pub async fn login(state: &AppState, credentials: Credentials) -> ApiResult<String> {
    let (username, password) = credentials.required()?;

    let user = state
        .users
        .find_user_by_username(&username)
        .await
        .map_err(|e| ApiError::internal("Failed to look up user", e))?;

    let Some(user) = user else {
        warn!(username = %username, "Login for unknown user");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    let stored_hash = user.password_hash.clone();
    let valid = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| ApiError::internal("Password verification task failed", e))?;
    if !valid {
        warn!(username = %username, "Login with wrong password");
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = jwt::create_token(&user.username, &state.auth.jwt_secret, state.auth.expiry_hours)
        .map_err(|e| ApiError::internal("Failed to issue token", e))?;

    info!(user_id = user.id, username = %user.username, "User logged in");
    Ok(token)
}
