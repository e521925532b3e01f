use anyhow::{Result, anyhow};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, get_current_timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TOKEN_ISSUER: &str = "tubely-access";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenClaims {
    pub iss: String,
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// Mints an HS256 access token for `user_id`.
pub fn create_access_token(user_id: Uuid, secret: &str, ttl_secs: u64) -> Result<String> {
    let now = get_current_timestamp();

    let claims = TokenClaims {
        iss: TOKEN_ISSUER.to_string(),
        sub: user_id,
        exp: (now + ttl_secs) as usize,
        iat: now as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!(e.to_string()))
}

pub fn validate_access_token(token: &str, secret: &str) -> Result<TokenClaims> {
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Ok(data.claims)
}

/// Pulls the token out of an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    header_value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}
