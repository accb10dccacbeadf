use std::path::Path;

use crate::error::ExtractError;
use crate::processor::{read_document, ExtractedText};

/// Reads the embedded text layer of a PDF. Scanned PDFs without a text
/// layer yield empty text.
#[derive(Debug, Default)]
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let _span = tracing::info_span!("extract.pdf").entered();

        let bytes = read_document(path)?;
        let doc = lopdf::Document::load_mem(&bytes)
            .map_err(|e| ExtractError::Pdf(format!("Failed to load PDF: {}", e)))?;

        let pages = doc.get_pages();
        let mut text = String::new();
        for page_num in pages.keys() {
            match doc.extract_text(&[*page_num]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                }
                Err(e) => log::debug!("No text on page {} of {}: {}", page_num, path.display(), e),
            }
        }

        if text.trim().is_empty() {
            log::info!("{} has no text layer", path.display());
        }

        Ok(ExtractedText {
            text,
            page_count: pages.len() as i64,
        })
    }
}
