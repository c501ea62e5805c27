//! PDF text extraction and the character budget applied before prompting.
//!
//! `pdf_extract` can panic on malformed input rather than returning an error,
//! so extraction runs inside `catch_unwind` and both outcomes become
//! [`ApiError::Pdf`].

use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, instrument, warn};

use crate::config::{Limits, TextOverflow};
use crate::error::ApiError;
use crate::util::take_chars;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Extract the plain text of a PDF held in memory. Blocking; call from `spawn_blocking`.
#[instrument(level = "info", skip(data), fields(bytes = data.len()))]
pub fn extract_text(data: &[u8]) -> Result<String, ApiError> {
  if !data.starts_with(PDF_MAGIC) {
    return Err(ApiError::Pdf("file is not a PDF".into()));
  }

  let result = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(data)));
  let text = match result {
    Ok(Ok(text)) => text,
    Ok(Err(e)) => return Err(ApiError::Pdf(e.to_string())),
    Err(_) => return Err(ApiError::Pdf("malformed document".into())),
  };

  let text = text.trim().to_string();
  if text.is_empty() {
    return Err(ApiError::EmptyDocument);
  }
  debug!(target: "flashcards_backend", chars = text.chars().count(), "PDF text extracted");
  Ok(text)
}

/// Apply `limits.max_text_chars` according to `limits.text_overflow`.
pub fn cap_text(text: String, limits: &Limits) -> Result<String, ApiError> {
  let chars = text.chars().count();
  if chars <= limits.max_text_chars {
    return Ok(text);
  }
  match limits.text_overflow {
    TextOverflow::Reject => Err(ApiError::TextTooLong { chars, limit: limits.max_text_chars }),
    TextOverflow::Truncate => {
      warn!(target: "flashcards_backend", chars, limit = limits.max_text_chars, "PDF text truncated to budget");
      Ok(take_chars(&text, limits.max_text_chars).to_string())
    }
  }
}

/// Single-page PDF with one line of Helvetica text, xref offsets computed.
#[cfg(test)]
pub(crate) fn sample_pdf(text: &str) -> Vec<u8> {
  let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
  let objects = [
    "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
    "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>".to_string(),
    "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_string(),
    format!("<< /Length {} >>\nstream\n{}\nendstream", content.len(), content),
  ];

  let mut out = String::from("%PDF-1.4\n");
  let mut offsets = Vec::with_capacity(objects.len());
  for (i, body) in objects.iter().enumerate() {
    offsets.push(out.len());
    out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, body));
  }
  let xref_at = out.len();
  out.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
  for off in offsets {
    out.push_str(&format!("{:010} 00000 n \n", off));
  }
  out.push_str(&format!("trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n", objects.len() + 1, xref_at));
  out.into_bytes()
}
