use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use serde::Serialize;
use std::future::{ready, Ready};

use crate::auth::token::Claims;
use crate::auth::ADMIN_ROLE;
use crate::error::AppError;

/// The verified caller of the current request.
///
/// `AuthMiddleware` inserts it into the request extensions after the bearer token
/// validated; handlers receive it by naming it as an argument. It lives exactly as long
/// as the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestIdentity {
    pub developer_id: String,
    pub email: String,
    pub role: String,
}

impl RequestIdentity {
    /// Numeric developer id for database lookups.
    ///
    /// Tokens are only issued with numeric subjects, so a non-numeric one is treated as
    /// an invalid credential.
    pub fn numeric_id(&self) -> Result<i32, AppError> {
        self.developer_id
            .parse()
            .map_err(|_| AppError::Unauthorized("Invalid token".into()))
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}

impl From<Claims> for RequestIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            developer_id: claims.developer_id,
            email: claims.email,
            role: claims.role,
        }
    }
}

impl FromRequest for RequestIdentity {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<RequestIdentity>().cloned() {
            Some(identity) => ready(Ok(identity)),
            None => {
                // Only reachable on a route that is not wrapped by AuthMiddleware.
                let err = AppError::Unauthorized("Authorization header required".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;

    fn identity() -> RequestIdentity {
        RequestIdentity {
            developer_id: "123".into(),
            email: "dev@example.com".into(),
            role: "developer".into(),
        }
    }

    #[actix_rt::test]
    async fn test_request_identity_extractor_success() {
        let req = actix_test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(identity());

        let mut payload = Payload::None;
        let extracted = RequestIdentity::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap(), identity());
    }

    #[actix_rt::test]
    async fn test_request_identity_extractor_failure() {
        let req = actix_test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = RequestIdentity::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_numeric_developer_id() {
        assert_eq!(identity().numeric_id().unwrap(), 123);

        let odd = RequestIdentity {
            developer_id: "abc".into(),
            ..identity()
        };
        assert!(odd.numeric_id().is_err());
    }

    #[test]
    fn test_is_admin() {
        assert!(!identity().is_admin());
        let admin = RequestIdentity {
            role: "admin".into(),
            ..identity()
        };
        assert!(admin.is_admin());
    }
}
