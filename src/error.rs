//! Error types.
//!
//! * [`FlashcardError`] covers turning a model completion into flashcards. Every
//!   variant is final for the request: no retries happen at this layer.
//! * [`ApiError`] is what HTTP handlers return. It maps each failure to a status
//!   code and a user-displayable message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::protocol::ErrorOut;

/// Failures of the completion → flashcard pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlashcardError {
    /// No parse strategy produced JSON. `preview` holds at most the first 100
    /// characters of the completion.
    #[error("Model response is not valid JSON (starts with: {preview:?})")]
    MalformedResponse { preview: String },

    /// The parsed value holds no list-like payload.
    #[error("Model response does not contain a list of flashcards")]
    InvalidShape,

    /// The payload list was empty.
    #[error("No valid flashcards generated")]
    NoFlashcards,

    /// Strict entry policy only: one entry could not be used.
    #[error("Invalid flashcard at index {index}")]
    InvalidEntry { index: usize },
}

/// Errors surfaced by the HTTP layer.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No PDF file uploaded")]
    MissingPdf,

    #[error("{0}")]
    BadRequest(String),

    #[error("PDF exceeds the {limit} byte upload limit")]
    PayloadTooLarge { limit: usize },

    #[error("PDF content is too long. Please use a shorter document (maximum {limit} characters).")]
    TextTooLong { chars: usize, limit: usize },

    #[error("No extractable text found in PDF")]
    EmptyDocument,

    #[error("Could not read PDF: {0}")]
    Pdf(String),

    #[error("Server configuration error")]
    NotConfigured,

    #[error("Error contacting the language model")]
    Upstream(String),

    #[error("Error generating flashcards. Please try again.")]
    Flashcards(#[from] FlashcardError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingPdf | ApiError::BadRequest(_) | ApiError::TextTooLong { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::EmptyDocument | ApiError::Pdf(_) | ApiError::Flashcards(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NotConfigured => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Extra detail shown next to the message, when there is any.
    fn detail(&self) -> Option<String> {
        match self {
            ApiError::Flashcards(e) => Some(e.to_string()),
            ApiError::Upstream(e) => Some(e.clone()),
            _ => None,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(target: "flashcards_backend", %status, error = ?self, "Request failed");
        } else {
            warn!(target: "flashcards_backend", %status, error = ?self, "Request rejected");
        }
        let body = ErrorOut {
            success: false,
            message: self.to_string(),
            error: self.detail(),
        };
        (status, Json(body)).into_response()
    }
}
