//! Local document text extraction.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("PDF contains no extractable text")]
    NoText,
}

#[async_trait]
pub trait DocumentReader: Send + Sync {
    async fn extract_text(&self, pdf: Bytes) -> Result<String, DocumentError>;
}

/// `pdf-extract` backed reader. Parsing is CPU-bound and runs on the blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextExtractor;

#[async_trait]
impl DocumentReader for PdfTextExtractor {
    async fn extract_text(&self, pdf: Bytes) -> Result<String, DocumentError> {
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&pdf))
            .await
            // pdf-extract panics on some malformed inputs; a panicked task surfaces here.
            .map_err(|e| DocumentError::Pdf(format!("extraction aborted: {e}")))?
            .map_err(|e| DocumentError::Pdf(e.to_string()))?;

        let text = normalize_whitespace(&text);
        if text.is_empty() {
            return Err(DocumentError::NoText);
        }

        debug!("Extracted {} chars of PDF text", text.len());
        Ok(text)
    }
}

/// Trims each line and collapses runs of blank lines left by PDF layout.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            blank_run = true;
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
            if blank_run {
                out.push('\n');
            }
        }
        out.push_str(line);
        blank_run = false;
    }
    out
}
