//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs a request id plus basic result info.

use std::sync::Arc;
use axum::{
  extract::{multipart::MultipartError, Multipart, State},
  http::StatusCode,
  response::IntoResponse,
  Json,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::error::ApiError;
use crate::logic::{decode_base64_pdf, process_pdf};
use crate::protocol::*;
use crate::state::AppState;

/// Multipart field carrying the uploaded file.
const PDF_FIELD: &str = "pdf";

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, model_configured: state.openai.is_some() })
}

#[instrument(level = "info", skip(state, multipart), fields(request_id = %Uuid::new_v4()))]
pub async fn http_post_process_pdf(
  State(state): State<Arc<AppState>>,
  mut multipart: Multipart,
) -> Result<Json<FlashcardsOut>, ApiError> {
  let limit = state.config.limits.max_file_bytes;
  let map_err = |e: MultipartError| {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
      ApiError::PayloadTooLarge { limit }
    } else {
      ApiError::BadRequest(format!("Invalid form data: {}", e.body_text()))
    }
  };

  let mut upload: Option<(Vec<u8>, Option<String>)> = None;
  while let Some(field) = multipart.next_field().await.map_err(map_err)? {
    if field.name() != Some(PDF_FIELD) {
      debug!(target: "flashcards_backend", field = ?field.name(), "Ignoring form field");
      continue;
    }
    let file_name = field.file_name().map(str::to_string);
    let bytes = field.bytes().await.map_err(map_err)?;
    upload = Some((bytes.to_vec(), file_name));
    break;
  }

  let (pdf, file_name) = upload.filter(|(b, _)| !b.is_empty()).ok_or(ApiError::MissingPdf)?;
  info!(target: "flashcards_backend", bytes = pdf.len(), file_name = ?file_name, "PDF file received");

  let flashcards = process_pdf(&state, pdf, file_name.as_deref()).await?;
  info!(target: "flashcards_backend", count = flashcards.len(), "HTTP flashcards served");
  Ok(Json(FlashcardsOut::new(flashcards)))
}

#[instrument(level = "info", skip(state, body), fields(request_id = %Uuid::new_v4(), b64_len = body.pdf_base64.len()))]
pub async fn http_post_process_pdf_base64(
  State(state): State<Arc<AppState>>,
  Json(body): Json<Base64PdfIn>,
) -> Result<Json<FlashcardsOut>, ApiError> {
  let pdf = decode_base64_pdf(&body.pdf_base64)?;
  info!(target: "flashcards_backend", bytes = pdf.len(), file_name = ?body.file_name, "PDF file received (base64)");

  let flashcards = process_pdf(&state, pdf, body.file_name.as_deref()).await?;
  info!(target: "flashcards_backend", count = flashcards.len(), "HTTP flashcards served");
  Ok(Json(FlashcardsOut::new(flashcards)))
}
