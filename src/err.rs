use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Json;

use serde::Serialize;

pub async fn handler404(path: Uri) -> Response {
    Error::NotFound {
        message: format!("Invalid path: {}", path),
    }
    .into_response()
}

/// Everything a handler can fail with. Each variant maps onto exactly one
/// HTTP status; the body is always `{"error": "<message>"}`.
#[derive(Debug, Clone)]
pub enum Error {
    Validation { message: String },
    DuplicateEmail { message: String },
    NotFound { message: String },
    Unauthorized { message: String },
    InvalidCredential { message: String },
    InternalError { kind: &'static str, message: String },
}

#[derive(Debug, Clone, Serialize)]
struct ErrorBody {
    error: String,
}

impl Error {
    pub fn validation<S: Into<String>>(msg: S) -> Error {
        Error::Validation {
            message: msg.into(),
        }
    }

    pub fn unauthorized<S: Into<String>>(msg: S) -> Error {
        Error::Unauthorized {
            message: msg.into(),
        }
    }

    pub fn not_found<S: Into<String>>(msg: S) -> Error {
        Error::NotFound {
            message: msg.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::DuplicateEmail { .. } => StatusCode::CONFLICT,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::InvalidCredential { .. } => StatusCode::UNAUTHORIZED,
            Error::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> &str {
        match self {
            Error::Validation { message }
            | Error::DuplicateEmail { message }
            | Error::NotFound { message }
            | Error::Unauthorized { message }
            | Error::InvalidCredential { message }
            | Error::InternalError { message, .. } => message,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Error::InternalError { kind, message } = self {
            write!(f, "{}: {}", kind, message)
        } else {
            f.write_str(self.message())
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        if let Error::InternalError { kind, message } = &self {
            log::error!("{}: {}", kind, message);
        }
        (
            self.status(),
            Json(ErrorBody {
                error: self.message().to_string(),
            }),
        )
            .into_response()
    }
}

impl From<std::io::Error> for Error {
    fn from(io: std::io::Error) -> Self {
        Self::InternalError {
            kind: "IOError",
            message: io.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InternalError {
            kind: "SerializationError",
            message: err.to_string(),
        }
    }
}

impl From<pbkdf2::password_hash::Error> for Error {
    fn from(err: pbkdf2::password_hash::Error) -> Self {
        Self::InternalError {
            kind: "PasswordHashError",
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError {
            kind: "Unknown",
            message: err.to_string(),
        }
    }
}
