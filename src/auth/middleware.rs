use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderValue},
    Error, HttpMessage,
};
use chrono::{DateTime, Utc};
use futures::future::{ready, LocalBoxFuture, Ready};
use std::rc::Rc;
use std::sync::Arc;

use crate::auth::extractors::RequestIdentity;
use crate::auth::token::{extract_bearer_token, TokenService};
use crate::auth::ADMIN_ROLE;
use crate::error::{AppError, AuthError};

/// Authenticates a request from its `Authorization` header value.
///
/// Walks the request from unauthenticated to authenticated: header present, bearer shape,
/// then signature and validity window. The first failing step decides the error.
pub fn authenticate(
    tokens: &TokenService,
    authorization: Option<&HeaderValue>,
    now: DateTime<Utc>,
) -> Result<RequestIdentity, AuthError> {
    let header_value = match authorization {
        Some(value) if !value.is_empty() => value
            .to_str()
            .map_err(|_| AuthError::MalformedCredential)?,
        _ => return Err(AuthError::MissingCredential),
    };

    let token = extract_bearer_token(header_value).map_err(|_| AuthError::MalformedCredential)?;
    let claims = tokens.validate_token(token, now)?;

    Ok(RequestIdentity::from(claims))
}

/// Passes when the identity holds `required` or the admin override role.
pub fn authorize(identity: &RequestIdentity, required: &str) -> Result<(), AuthError> {
    if identity.role == required || identity.role == ADMIN_ROLE {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}

/// Rejects requests without a valid bearer token and attaches a [`RequestIdentity`]
/// to the request extensions of the ones that pass.
#[derive(Clone)]
pub struct AuthMiddleware {
    tokens: Arc<TokenService>,
}

impl AuthMiddleware {
    pub fn new(tokens: Arc<TokenService>) -> Self {
        Self { tokens }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service,
            tokens: self.tokens.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: S,
    tokens: Arc<TokenService>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = authenticate(
            &self.tokens,
            req.headers().get(header::AUTHORIZATION),
            Utc::now(),
        );

        match outcome {
            Ok(identity) => {
                req.extensions_mut().insert(identity);
                Box::pin(self.service.call(req))
            }
            Err(auth_err) => {
                log::debug!(
                    "rejecting {} {}: {}",
                    req.method(),
                    req.path(),
                    auth_err
                );
                let app_err = AppError::from(auth_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}

/// Role gate for routes that need more than a valid token.
///
/// Must run inside [`AuthMiddleware`]; a request that reaches it without an identity
/// is treated as unauthenticated. The `admin` role satisfies every requirement.
#[derive(Clone)]
pub struct RequireRole {
    required: Rc<str>,
}

impl RequireRole {
    pub fn new(required: &str) -> Self {
        Self {
            required: Rc::from(required),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireRole
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RequireRoleService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequireRoleService {
            service,
            required: self.required.clone(),
        }))
    }
}

pub struct RequireRoleService<S> {
    service: S,
    required: Rc<str>,
}

impl<S, B> Service<ServiceRequest> for RequireRoleService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = match req.extensions().get::<RequestIdentity>() {
            Some(identity) => authorize(identity, &self.required),
            None => Err(AuthError::MissingCredential),
        };

        match outcome {
            Ok(()) => Box::pin(self.service.call(req)),
            Err(auth_err) => {
                log::debug!(
                    "{} {} requires role {:?}: {}",
                    req.method(),
                    req.path(),
                    self.required,
                    auth_err
                );
                let app_err = AppError::from(auth_err);
                Box::pin(async move { Err(app_err.into()) })
            }
        }
    }
}
