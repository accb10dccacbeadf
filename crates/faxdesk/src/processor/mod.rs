//! Text extraction collaborator for incoming documents.
//!
//! [`DocumentExtractor`] routes by file extension: PDFs go through lopdf's
//! text layer, TIFF scans through OCR.

pub mod ocr;
pub mod pdf;
pub mod tiff;

use std::path::Path;

use serde::Serialize;

use crate::error::ExtractError;

/// File extensions accepted from the watch folder and manual ingestion.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["pdf", "tif", "tiff"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Tiff,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

/// True when `path` has one of [`SUPPORTED_EXTENSIONS`] (any case).
pub fn is_supported(path: &Path) -> bool {
    DocumentFormat::from_path(path).is_some()
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: i64,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError>;
}

pub struct DocumentExtractor {
    pdf: pdf::PdfExtractor,
    tiff: tiff::TiffExtractor,
}

impl DocumentExtractor {
    pub fn new(ocr_languages: &[String]) -> Self {
        Self {
            pdf: pdf::PdfExtractor::new(),
            tiff: tiff::TiffExtractor::new(ocr::OcrEngine::new(ocr_languages)),
        }
    }
}

impl Extractor for DocumentExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        match DocumentFormat::from_path(path) {
            Some(DocumentFormat::Pdf) => self.pdf.extract(path),
            Some(DocumentFormat::Tiff) => self.tiff.extract(path),
            None => Err(ExtractError::UnsupportedFormat(
                path.extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or("")
                    .to_string(),
            )),
        }
    }
}

pub(crate) fn read_document(path: &Path) -> Result<Vec<u8>, ExtractError> {
    std::fs::read(path).map_err(|e| ExtractError::ReadDocument {
        path: path.to_path_buf(),
        source: e,
    })
}
