use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::domain::types::User;
use crate::error::AccountServiceError;

/// Token kind carried in the `type` claim. Refresh tokens never authorize
/// general API access; the gate enforces that per route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims for both access and refresh tokens.
///
/// `sub` is the user's alternative ID, never the row ID — rotating the
/// alternative ID is the revocation mechanism.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub exp: u64,
}

/// Signing secret plus the two independent expiry windows.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

fn issue(
    subject: &str,
    token_type: TokenType,
    exp: u64,
    secret: &str,
) -> Result<String, AccountServiceError> {
    let claims = TokenClaims {
        sub: subject.to_owned(),
        token_type,
        exp,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AccountServiceError::Internal(e.into()))
}

pub fn issue_access_token(
    user: &User,
    config: &TokenConfig,
) -> Result<(String, u64), AccountServiceError> {
    let exp = now_secs() + config.access_ttl_secs;
    let token = issue(&user.alternative_id, TokenType::Access, exp, &config.secret)?;
    Ok((token, exp))
}

pub fn issue_refresh_token(user: &User, config: &TokenConfig) -> Result<String, AccountServiceError> {
    let exp = now_secs() + config.refresh_ttl_secs;
    issue(&user.alternative_id, TokenType::Refresh, exp, &config.secret)
}

/// Validate a token and return its claims. The only two kinds surfaced are
/// `TokenExpired` and `Unauthenticated` (signature/format failures).
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, AccountServiceError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AccountServiceError::TokenExpired,
        _ => AccountServiceError::Unauthenticated("invalid token"),
    })?;

    Ok(data.claims)
}

/// Output of every flow that ends in a fresh token pair (register, login,
/// passkey login).
#[derive(Debug)]
pub struct AuthOutput {
    pub user: User,
    pub access_token: String,
    pub access_token_exp: u64,
    pub refresh_token: String,
}

pub fn issue_token_pair(user: User, config: &TokenConfig) -> Result<AuthOutput, AccountServiceError> {
    let (access_token, access_token_exp) = issue_access_token(&user, config)?;
    let refresh_token = issue_refresh_token(&user, config)?;
    Ok(AuthOutput {
        user,
        access_token,
        access_token_exp,
        refresh_token,
    })
}
