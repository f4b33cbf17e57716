use std::sync::Arc;

use axum::headers::authorization::Bearer;
use axum::headers::Authorization;
use axum::{Extension, Json, TypedHeader};
use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::Pbkdf2;
use rand_core::OsRng;

use crate::err::Error;
use crate::models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest};
use crate::store::Store;
use crate::token::{self, Claims};
use crate::{proceeds, Payload};

pub async fn register(
    Extension(store): Extension<Arc<Store>>,
    Json(body): Json<RegisterRequest>,
) -> Payload<AuthResponse> {
    if body.name.is_empty()
        || body.course.is_empty()
        || body.college.is_empty()
        || body.email.is_empty()
        || body.password.is_empty()
    {
        return Err(Error::validation(
            "name, course, college, email and password are required",
        ));
    }

    let password_hash = hash_password(&body.password)?;
    let user = store
        .register_user(body.name, body.course, body.college, body.email, password_hash)
        .await?;

    let token = token::issue(&user)?;
    log::info!("Registered user {} ({})", user.email, user.id);
    proceeds(AuthResponse {
        message: "Registration successful".to_string(),
        token,
        user: user.public(),
    })
}

pub async fn login(
    Extension(store): Extension<Arc<Store>>,
    Json(body): Json<LoginRequest>,
) -> Payload<AuthResponse> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(Error::validation("email and password are required"));
    }

    let user = store
        .user_by_email(&body.email)
        .await
        .ok_or_else(|| Error::not_found("No account found for this email"))?;

    if !verify_password(&body.password, &user.password_hash)? {
        return Err(Error::InvalidCredential {
            message: "Incorrect password".to_string(),
        });
    }

    let token = token::issue(&user)?;
    proceeds(AuthResponse {
        message: "Login successful".to_string(),
        token,
        user: user.public(),
    })
}

pub async fn me(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    Extension(store): Extension<Arc<Store>>,
) -> Payload<MeResponse> {
    let claims = authorize(bearer)?;
    let user = store
        .user_by_id(claims.sub)
        .await
        .ok_or_else(|| Error::not_found("User no longer exists"))?;
    proceeds(MeResponse {
        user: user.public(),
    })
}

/// Verifies the bearer token on a protected route. A missing header and a
/// bad token are the same 401 to the caller.
pub fn authorize(bearer: Option<TypedHeader<Authorization<Bearer>>>) -> Result<Claims, Error> {
    let bearer = bearer.ok_or_else(|| Error::unauthorized("Missing bearer token"))?;
    token::verify(bearer.token())
}

pub fn hash_password(password: &str) -> Result<String, Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Pbkdf2.hash_password(password.as_bytes(), &salt)?.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
    let parsed = PasswordHash::new(hash)?;
    Ok(Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok())
}
