//!
//! # Error Handling
//!
//! This module defines the two error types used throughout the application:
//!
//! - [`AuthError`], the taxonomy of authentication and authorization failures produced
//!   by the token service and the authorization middleware.
//! - [`AppError`], the error returned by route handlers and middleware. It implements
//!   `actix_web::error::ResponseError` so every variant becomes an HTTP response with a
//!   JSON body of the form `{"error": "<message>"}`.
//!
//! `From` conversions exist for `sqlx::Error`, `validator::ValidationErrors`,
//! `bcrypt::BcryptError` and `AuthError`, so handlers can simply use `?`.

use actix_web::{error::ResponseError, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

/// Failures of the authentication and authorization layer.
///
/// Everything except `MisconfiguredService` and `TokenIssuance` is a client-side
/// condition that is turned into a 401 or 403 at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `Authorization` header, or an empty one.
    MissingCredential,
    /// The header is present but is not of the form `Bearer <token>`.
    MalformedCredential,
    /// Bad structure, bad signature or an unexpected signing algorithm.
    InvalidToken,
    /// Signature is fine but the current time is outside `[nbf, exp]`.
    ExpiredToken,
    /// Authenticated, but the role does not satisfy the route's requirement.
    Forbidden,
    /// The token service was constructed with an empty secret.
    MisconfiguredService,
    /// The signing library failed while minting a token.
    TokenIssuance(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AuthError::MissingCredential => write!(f, "missing credential"),
            AuthError::MalformedCredential => write!(f, "malformed credential"),
            AuthError::InvalidToken => write!(f, "invalid token"),
            AuthError::ExpiredToken => write!(f, "token has expired"),
            AuthError::Forbidden => write!(f, "insufficient permissions"),
            AuthError::MisconfiguredService => write!(f, "JWT secret key is required"),
            AuthError::TokenIssuance(msg) => write!(f, "failed to sign token: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

/// Represents all possible errors that can occur while serving a request.
///
/// Each variant carries the message that ends up in the JSON response body.
#[derive(Debug)]
pub enum AppError {
    /// Authentication is missing or failed (HTTP 401). The client should log in again
    /// or refresh its token.
    Unauthorized(String),
    /// The caller is authenticated but not allowed to do this (HTTP 403).
    Forbidden(String),
    /// Malformed or otherwise unacceptable request (HTTP 400).
    BadRequest(String),
    /// Requested resource does not exist (HTTP 404).
    NotFound(String),
    /// The request conflicts with existing state, e.g. a duplicate email (HTTP 409).
    Conflict(String),
    /// Unexpected server-side failure (HTTP 500).
    InternalServerError(String),
    /// Failure inside a database operation (HTTP 500). Wraps `sqlx` errors.
    DatabaseError(String),
    /// Payload failed `validator` checks (HTTP 422).
    ValidationError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::Unauthorized(msg) => HttpResponse::Unauthorized().json(json!({
                "error": msg
            })),
            AppError::Forbidden(msg) => HttpResponse::Forbidden().json(json!({
                "error": msg
            })),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(json!({
                "error": msg
            })),
            AppError::NotFound(msg) => HttpResponse::NotFound().json(json!({
                "error": msg
            })),
            AppError::Conflict(msg) => HttpResponse::Conflict().json(json!({
                "error": msg
            })),
            AppError::InternalServerError(msg) => HttpResponse::InternalServerError().json(json!({
                "error": msg
            })),
            // Database details stay in the logs.
            AppError::DatabaseError(msg) => {
                log::error!("database error: {}", msg);
                HttpResponse::InternalServerError().json(json!({
                    "error": "Internal server error"
                }))
            }
            AppError::ValidationError(msg) => HttpResponse::UnprocessableEntity().json(json!({
                "error": msg
            })),
        }
    }
}

/// Maps the auth taxonomy onto client-visible responses.
///
/// Expired and invalid tokens get different messages so clients can tell
/// "refresh your token" from "log in again"; the reason a signature failed is never exposed.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::MissingCredential => {
                AppError::Unauthorized("Authorization header required".into())
            }
            AuthError::MalformedCredential => {
                AppError::Unauthorized("Invalid authorization header format".into())
            }
            AuthError::InvalidToken => AppError::Unauthorized("Invalid token".into()),
            AuthError::ExpiredToken => AppError::Unauthorized("Token has expired".into()),
            AuthError::Forbidden => AppError::Forbidden("Insufficient permissions".into()),
            AuthError::MisconfiguredService | AuthError::TokenIssuance(_) => {
                log::error!("authentication infrastructure failure: {}", error);
                AppError::InternalServerError("Failed to generate token".into())
            }
        }
    }
}

/// `RowNotFound` becomes `NotFound`; everything else is a `DatabaseError`.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}
