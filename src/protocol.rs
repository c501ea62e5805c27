//! Public protocol structs for HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::FlashcardSet;

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    /// Whether uploads can reach the language model.
    pub model_configured: bool,
}

/// Successful upload response. `flashcards` is the bare array the frontend iterates.
#[derive(Debug, Serialize)]
pub struct FlashcardsOut {
    pub success: bool,
    pub message: String,
    pub flashcards: FlashcardSet,
}

impl FlashcardsOut {
    pub fn new(flashcards: FlashcardSet) -> Self {
        Self {
            success: true,
            message: "PDF processed successfully".into(),
            flashcards,
        }
    }
}

/// Error body for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorOut {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Upload as JSON instead of multipart. `pdfBase64` may be a bare base64
/// string or a `data:application/pdf;base64,...` URL.
#[derive(Deserialize)]
pub struct Base64PdfIn {
    #[serde(rename = "pdfBase64")]
    pub pdf_base64: String,
    #[serde(rename = "fileName", default)]
    pub file_name: Option<String>,
}
