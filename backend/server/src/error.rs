use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{config::ConfigError, database::StoreError, session::SessionError, views};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed recipe id: {0}")]
    MalformedId(String),

    #[error("Malformed form field: {0}")]
    MalformedForm(String),

    #[error("No such wizard step: {0}")]
    UnknownStep(String),

    #[error("Recipe not found")]
    RecipeNotFound,

    #[error("Page not found")]
    PageNotFound,

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Webhook disabled")]
    WebhookDisabled,

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Deploy command failed: {0}")]
    Deploy(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MalformedId(_) | AppError::MalformedForm(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownStep(_)
            | AppError::RecipeNotFound
            | AppError::PageNotFound
            | AppError::WebhookDisabled => StatusCode::NOT_FOUND,
            AppError::InvalidSignature => StatusCode::UNAUTHORIZED,
            AppError::Rejected { status, .. } => *status,
            AppError::Store(_) | AppError::Session(_) | AppError::Deploy(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = if status.is_server_error() {
            error!("{self}");
            "Something went wrong on our side.".to_string()
        } else {
            warn!("{self}");
            self.to_string()
        };

        (status, Html(views::error_page(status, &message))).into_response()
    }
}

#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database unavailable: {0}")]
    Store(#[from] StoreError),

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}
