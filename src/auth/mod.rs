//! Token-based authentication and role-based authorization.
//!
//! - [`token`]: the stateless [`TokenService`] that mints and verifies access/refresh pairs.
//! - [`middleware`]: [`AuthMiddleware`], which turns a bearer token into a
//!   [`RequestIdentity`], and [`RequireRole`], the per-route role gate.
//! - [`extractors`]: the [`RequestIdentity`] handlers receive.
//! - [`password`]: bcrypt hashing used by login and registration.

pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::Developer;

pub use extractors::RequestIdentity;
pub use middleware::{authenticate, authorize, AuthMiddleware, RequireRole};
pub use password::PasswordHasher;
pub use token::{extract_bearer_token, Claims, TokenPair, TokenService, TOKEN_TYPE};

/// Role that satisfies every role requirement.
pub const ADMIN_ROLE: &str = "admin";
/// Role given to self-registered developers.
pub const DEFAULT_ROLE: &str = "developer";

/// Represents the payload for a login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Represents the payload for a new developer registration.
///
/// There is no role field: self-registered accounts always get [`DEFAULT_ROLE`].
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name, 2 to 100 characters.
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    /// At least 6 characters.
    #[validate(length(min = 6, max = 128))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Response to a successful login or registration.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub developer: Developer,
    pub token: TokenPair,
}

/// Response to a successful refresh.
#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: TokenPair,
}
