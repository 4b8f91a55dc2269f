//! Authentication: password hashing, JWT issuance and the request extractor

pub mod jwt;
pub mod middleware;
pub mod password;

pub use middleware::AuthUser;

use crate::config::DEFAULT_JWT_EXPIRY_HOURS;

/// Token signing settings
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub expiry_hours: i64,
}

impl AuthConfig {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            expiry_hours: DEFAULT_JWT_EXPIRY_HOURS,
        }
    }

    pub fn with_expiry_hours(mut self, expiry_hours: i64) -> Self {
        self.expiry_hours = expiry_hours;
        self
    }
}
