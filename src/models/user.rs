//! Account model

use serde::{Deserialize, Serialize};

/// Longest username the `users` table accepts, in characters
pub const USERNAME_MAX_LEN: usize = 100;

/// Registered account. `password_hash` is an argon2 PHC string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
}
