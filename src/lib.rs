pub mod auth;
pub mod err;
pub mod models;
pub mod notify;
pub mod nudge;
pub mod reminders;
pub mod store;
pub mod token;

use std::sync::Arc;

use axum::handler::Handler;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::err::Error;
use crate::store::Store;

pub type Payload<T> = Result<Json<T>, Error>;

pub fn proceeds<V>(value: V) -> Payload<V>
where
    V: Serialize,
{
    Ok(Json(value))
}

/// Builds the full API router around one shared store.
pub fn app(store: Arc<Store>) -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/me", get(auth::me))
        .route("/api/reminders", post(reminders::create).get(reminders::list))
        .route("/api/reminders/nudge", get(reminders::nudge))
        .fallback(err::handler404.into_service())
        .layer(Extension(store))
}
