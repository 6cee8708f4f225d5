//! Application error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::llm::ModelError;
use crate::views::{error_page, PageContext};

#[derive(Debug, Error)]
pub enum AppError {
    /// Submission fields failed validation; messages joined with `,`
    #[error("{0}")]
    Validation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("This page not found")]
    NotFound,

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Analysis(_) | AppError::Model(_) => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the visitor
    pub fn public_message(&self) -> String {
        match self {
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::Analysis(e) => {
                tracing::warn!(error = %e, "Analysis failed");
                e.to_string()
            }
            AppError::Model(e) => {
                tracing::warn!(error = %e, "Model call failed");
                e.to_string()
            }
            other => other.to_string(),
        }
    }

    /// Render as an error page within the caller's session context
    pub fn into_page(self, ctx: &PageContext) -> Response {
        let status = self.status();
        let message = self.public_message();
        (status, error_page(ctx, status, &message)).into_response()
    }
}

impl From<marketmapper_core::Error> for AppError {
    fn from(e: marketmapper_core::Error) -> Self {
        match e {
            marketmapper_core::Error::Validation(_) => {
                AppError::Validation(e.validation_messages().join(","))
            }
            other => AppError::BadRequest(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_page(&PageContext::anonymous())
    }
}
