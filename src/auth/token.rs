use crate::config::AuthConfig;
use crate::error::AuthError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of `token_type` in every issued pair.
pub const TOKEN_TYPE: &str = "Bearer";

const BEARER_PREFIX: &str = "Bearer ";

// Tokens are signed with HS256 but any HMAC variant under the same secret verifies.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Represents the claims encoded within an access or refresh token.
///
/// Both token kinds share this shape; only `exp` differs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Stringified developer id.
    pub developer_id: String,
    /// Informational; never re-checked against the database.
    pub email: String,
    /// Role name driving authorization, e.g. `developer` or `admin`.
    pub role: String,
    /// Standard subject claim, same value as `developer_id`.
    pub sub: String,
    /// Issued at (seconds since epoch).
    pub iat: i64,
    /// Not before (seconds since epoch).
    pub nbf: i64,
    /// Expiration (seconds since epoch).
    pub exp: i64,
}

impl Claims {
    fn new(subject: &str, email: &str, role: &str, now: DateTime<Utc>, ttl: Duration) -> Self {
        let issued_at = now.timestamp();
        Self {
            developer_id: subject.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            sub: subject.to_string(),
            iat: issued_at,
            nbf: issued_at,
            exp: issued_at + ttl.num_seconds(),
        }
    }

    /// `true` when `now` lies within `[nbf, exp]`, bounds included.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let now = now.timestamp();
        self.nbf <= now && now <= self.exp
    }
}

/// Result of issuing or refreshing credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Lifetime of the access token in seconds at issuance.
    pub expires_in: i64,
    pub token_type: String,
}

/// Mints and verifies signed token pairs.
///
/// Holds nothing but immutable keys and lifetimes, so a single instance is shared
/// across all workers behind an `Arc` without locking. No data store is ever consulted.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_ttl: Duration,
    refresh_token_ttl: Duration,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    pub const DEFAULT_ACCESS_TOKEN_TTL_HOURS: i64 = 24;
    pub const DEFAULT_REFRESH_TOKEN_TTL_HOURS: i64 = 24 * 7;

    /// Creates a service with the default lifetimes (24 hours / 7 days).
    ///
    /// Returns `AuthError::MisconfiguredService` if `secret` is empty.
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        Self::with_lifetimes(
            secret,
            Duration::hours(Self::DEFAULT_ACCESS_TOKEN_TTL_HOURS),
            Duration::hours(Self::DEFAULT_REFRESH_TOKEN_TTL_HOURS),
        )
    }

    /// Creates a service with explicit access and refresh token lifetimes.
    pub fn with_lifetimes(
        secret: &str,
        access_token_ttl: Duration,
        refresh_token_ttl: Duration,
    ) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::MisconfiguredService);
        }

        // Expiry and not-before are checked against the caller's clock in `validate_token`,
        // so the library only verifies structure, signature and algorithm.
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "iat", "sub"]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            access_token_ttl,
            refresh_token_ttl,
        })
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AuthError> {
        Self::with_lifetimes(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )
    }

    pub fn access_token_ttl(&self) -> Duration {
        self.access_token_ttl
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token_ttl
    }

    /// Issues a fresh access/refresh pair for the given identity.
    ///
    /// Both tokens get `iat = nbf = now`; `exp` is `now` plus the respective lifetime.
    /// The only failure is an internal error of the signing library.
    pub fn generate_token_pair(
        &self,
        subject: &str,
        email: &str,
        role: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let access_claims = Claims::new(subject, email, role, now, self.access_token_ttl);
        let refresh_claims = Claims::new(subject, email, role, now, self.refresh_token_ttl);

        Ok(TokenPair {
            access_token: self.sign(&access_claims)?,
            refresh_token: self.sign(&refresh_claims)?,
            expires_in: self.access_token_ttl.num_seconds(),
            token_type: TOKEN_TYPE.to_string(),
        })
    }

    /// Verifies a token and returns its claims.
    ///
    /// # Errors
    /// - `AuthError::InvalidToken` if the token is malformed, its signature does not
    ///   verify, or it was signed with anything other than an HMAC algorithm.
    /// - `AuthError::ExpiredToken` if the token is authentic but `now` is outside `[nbf, exp]`.
    pub fn validate_token(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let claims = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("token rejected: {:?}", e.kind());
                AuthError::InvalidToken
            })?;

        if !claims.is_active_at(now) {
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }

    /// Exchanges a refresh token for a brand-new pair carrying the same identity.
    ///
    /// The refresh token is validated exactly like an access token. It stays usable until
    /// its own expiry; earlier exchanges are not tracked.
    pub fn refresh_token_pair(
        &self,
        refresh_token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenPair, AuthError> {
        let claims = self.validate_token(refresh_token, now)?;
        self.generate_token_pair(&claims.developer_id, &claims.email, &claims.role, now)
    }

    fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(SIGNING_ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssuance(e.to_string()))
    }
}

/// Returns the token part of an `Authorization: Bearer <token>` header value.
///
/// The prefix is case-sensitive and must be followed by a single space and a
/// non-empty token; any other shape is `AuthError::InvalidToken`.
pub fn extract_bearer_token(header_value: &str) -> Result<&str, AuthError> {
    match header_value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.is_empty() => Ok(token),
        _ => Err(AuthError::InvalidToken),
    }
}
