use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use maud::{html, DOCTYPE};
use thiserror::Error;
use tracing::{debug, error};

use crate::store::StoreError;
use crate::views::RenderError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found")]
    NotFound,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("missing form field {0}")]
    MissingFormField(&'static str),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("user store is not configured")]
    StoreUnavailable,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::MissingFormField(_) => StatusCode::BAD_REQUEST,
            AppError::Render(_) | AppError::Store(_) | AppError::StoreUnavailable => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            debug!(error = %self, status = %status, "request rejected");
        }

        let reason = status.canonical_reason().unwrap_or("Error");
        let detail = match self {
            AppError::MissingFormField(field) => format!("The form field \"{field}\" is required."),
            _ if status.is_server_error() => String::from("Something went wrong on our side."),
            other => format!("The request failed: {other}."),
        };
        let page = html! {
            (DOCTYPE)
            html lang="en" {
                head { title { (status.as_u16()) " " (reason) } }
                body {
                    h1 { (reason) }
                    p { (detail) }
                }
            }
        };
        (status, Html(page.into_string())).into_response()
    }
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
