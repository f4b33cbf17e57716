use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use jwt::{SignWithKey, VerifyWithKey};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::env;
use uuid::Uuid;

use crate::err::Error;
use crate::models::User;

/// Fallback used when `JWT_SECRET` is unset. Fine for local demos, nothing
/// else; any deployment must provide its own secret.
pub const DEFAULT_SECRET: &str = "deadline-tracker-dev-secret";

const TOKEN_LIFETIME_DAYS: i64 = 7;

lazy_static! {
    static ref JWT_SECRET: String =
        env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_SECRET.to_string());
}

/// Claim set carried by every session token. Validity is purely a function
/// of the signature and `exp`; there is no revocation list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub iat: i64,
    pub exp: i64,
}

/// Signs a 7-day session token for `user`.
pub fn issue(user: &User) -> Result<String, Error> {
    issue_at(user, Utc::now())
}

fn issue_at(user: &User, issued_at: DateTime<Utc>) -> Result<String, Error> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        name: user.name.clone(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::days(TOKEN_LIFETIME_DAYS)).timestamp(),
    };
    claims
        .sign_with_key(&signing_key()?)
        .map_err(|e| Error::InternalError {
            kind: "TokenError",
            message: e.to_string(),
        })
}

/// Verifies the signature and expiry of `token`, returning its claims.
pub fn verify(token: &str) -> Result<Claims, Error> {
    let claims: Claims = token
        .verify_with_key(&signing_key()?)
        .map_err(|_| Error::unauthorized("Invalid or expired token"))?;

    if Utc::now().timestamp() >= claims.exp {
        return Err(Error::unauthorized("Invalid or expired token"));
    }
    Ok(claims)
}

fn signing_key() -> Result<Hmac<Sha256>, Error> {
    Hmac::new_from_slice(JWT_SECRET.as_bytes()).map_err(|e| Error::InternalError {
        kind: "TokenError",
        message: e.to_string(),
    })
}
