//! Password hashing and signed session tokens
//!
//! Sessions are HS256 JWTs carried in the `session_token` cookie. The token names the
//! user; the middleware re-reads the user row on every request.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::entity::user;

/// Name of the session cookie
pub const SESSION_COOKIE: &str = "session_token";

/// bcrypt cost for stored passwords
const BCRYPT_COST: u32 = 10;

/// Claims embedded in a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    /// User row id
    pub sub: i64,
    pub employee_id: String,
    pub role: String,
    pub department: String,
    /// Issued-at (UTC Unix timestamp)
    pub iat: i64,
    /// Expiration (UTC Unix timestamp)
    pub exp: i64,
    /// Token id
    pub jti: String,
}

/// Issue a session token for `user`
pub fn issue_token(
    user: &user::Model,
    config: &AuthConfig,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: user.id,
        employee_id: user.employee_id.clone(),
        role: user.role.clone(),
        department: user.department.clone(),
        iat: now,
        exp: now + config.session_days * 24 * 60 * 60,
        jti: uuid::Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
}

/// Verify signature and expiry and return the claims
pub fn verify_token(
    token: &str,
    config: &AuthConfig,
) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

pub fn hash_password(password: &str) -> Result<String, bcrypt::BcryptError> {
    bcrypt::hash(password, BCRYPT_COST)
}

/// Returns false for a malformed hash instead of failing
pub fn verify_password(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}
