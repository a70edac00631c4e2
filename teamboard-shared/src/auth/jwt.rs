/// JWT verification for request identity
///
/// Teamboard does not issue session tokens itself; it verifies HS256 tokens
/// signed with the shared `JWT_SECRET`. The `sub` claim is the username the
/// core sees as `current_user`.
///
/// # Token Structure
///
/// ```json
/// {
///   "sub": "alice",
///   "iss": "teamboard",
///   "iat": 1704067200,
///   "exp": 1704153600,
///   "nbf": 1704067200
/// }
/// ```
///
/// [`create_token`] exists for tests and local tooling.
///
/// # Example
///
/// ```
/// use teamboard_shared::auth::jwt::{create_token, validate_token, Claims};
///
/// let secret = "a-very-long-secret-key-for-hs256-signing";
/// let token = create_token(&Claims::new("alice"), secret).unwrap();
/// let claims = validate_token(&token, secret).unwrap();
/// assert_eq!(claims.sub, "alice");
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Expected `iss` claim
pub const ISSUER: &str = "teamboard";

/// Default lifetime of tokens minted by [`Claims::new`]
const DEFAULT_EXPIRATION_HOURS: i64 = 24;

/// JWT errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer: expected teamboard")]
    InvalidIssuer,
}

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username
    pub sub: String,

    /// Issuer, always "teamboard"
    pub iss: String,

    /// Issued at (unix timestamp)
    pub iat: i64,

    /// Expiration (unix timestamp)
    pub exp: i64,

    /// Not before (unix timestamp)
    pub nbf: i64,
}

impl Claims {
    /// Claims for `username`, valid for 24 hours
    pub fn new(username: impl Into<String>) -> Self {
        Self::with_expiration(username, Duration::hours(DEFAULT_EXPIRATION_HOURS))
    }

    pub fn with_expiration(username: impl Into<String>, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: username.into(),
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, `exp` and `nbf`
///
/// # Errors
///
/// - `JwtError::Expired` once `exp` has passed
/// - `JwtError::InvalidIssuer` for tokens not issued for Teamboard
/// - `JwtError::ValidationError` for anything else (bad signature, malformed)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    if token_data.claims.sub.trim().is_empty() {
        return Err(JwtError::ValidationError("Empty subject".to_string()));
    }

    Ok(token_data.claims)
}
