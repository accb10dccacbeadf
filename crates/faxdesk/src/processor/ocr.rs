//! OCR engine for scanned pages.
//!
//! Built on tesseract through `leptess` when the `ocr` feature is enabled.
//! Without it every call reports the engine as unavailable.

use image::DynamicImage;

use crate::error::ExtractError;

pub const OCR_TOOL: &str = "Tesseract OCR";
pub const OCR_REMEDIATION: &str =
    "install tesseract (with language data) and rebuild faxdesk with `--features ocr`";

#[derive(Debug, Clone)]
pub struct OcrEngine {
    languages: String,
}

impl OcrEngine {
    pub fn new(languages: &[String]) -> Self {
        let languages = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };
        Self { languages }
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    #[cfg(feature = "ocr")]
    pub fn recognize(&self, img: &DynamicImage) -> Result<String, ExtractError> {
        use std::io::Cursor;

        let _span = tracing::info_span!("extract.ocr").entered();

        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ExtractError::Ocr(format!("Failed to convert image: {}", e)))?;

        let mut lt = leptess::LepTess::new(None, &self.languages).map_err(|e| {
            ExtractError::ToolUnavailable {
                tool: OCR_TOOL.to_string(),
                remediation: format!("{} ({})", OCR_REMEDIATION, e),
            }
        })?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ExtractError::Ocr(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| ExtractError::Ocr(e.to_string()))
    }

    #[cfg(not(feature = "ocr"))]
    pub fn recognize(&self, _img: &DynamicImage) -> Result<String, ExtractError> {
        Err(ExtractError::ToolUnavailable {
            tool: OCR_TOOL.to_string(),
            remediation: OCR_REMEDIATION.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_languages_joined() {
        let engine = OcrEngine::new(&["eng".to_string(), "deu".to_string()]);
        assert_eq!(engine.languages(), "eng+deu");
    }

    #[test]
    fn test_default_language() {
        assert_eq!(OcrEngine::new(&[]).languages(), "eng");
    }

    #[cfg(not(feature = "ocr"))]
    #[test]
    fn test_unavailable_without_feature() {
        let engine = OcrEngine::new(&[]);
        let err = engine
            .recognize(&DynamicImage::new_luma8(2, 2))
            .unwrap_err();
        assert!(err.is_tool_unavailable());
        assert!(err.to_string().contains("--features ocr"));
    }
}
