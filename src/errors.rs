use axum::{http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::store;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("validation")]
    Validation(String),
    #[error("not_found")]
    NotFound(String),
    #[error(transparent)]
    Store(store::Error),
}

impl From<store::Error> for Error {
    fn from(error: store::Error) -> Self {
        match error {
            store::Error::Validation(msg) => Self::Validation(msg),
            store::Error::NotFound(msg) => Self::NotFound(msg),
            error => Self::Store(error),
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum ErrorResponse {
    Validation { message: String },
    NotFound { message: String },
    Unexpected { message: String },
}

impl From<Error> for ErrorResponse {
    fn from(error: Error) -> Self {
        tracing::error!("{:?}", error);
        match error {
            Error::Validation(message) => Self::Validation { message },
            Error::NotFound(message) => Self::NotFound { message },
            Error::Store(_) => Self::Unexpected {
                message: "Storage error".into(),
            },
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let mut res = axum::Json(ErrorResponse::from(self)).into_response();
        *res.status_mut() = status;
        res
    }
}
