use std::io::{Cursor, Read, Seek};
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageBuffer, Luma, RgbImage, RgbaImage};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

use crate::error::ExtractError;
use crate::processor::ocr::OcrEngine;
use crate::processor::{read_document, ExtractedText};

/// PhotometricInterpretation value for scans where 0 is white.
const WHITE_IS_ZERO: u32 = 0;

/// OCRs every frame of a TIFF scan. Page texts are joined with newlines.
pub struct TiffExtractor {
    ocr: OcrEngine,
}

impl TiffExtractor {
    pub fn new(ocr: OcrEngine) -> Self {
        Self { ocr }
    }

    pub fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let _span = tracing::info_span!("extract.tiff").entered();

        let bytes = read_document(path)?;
        let pages = decode_pages(&bytes)?;

        let mut texts = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            log::debug!("OCR page {}/{} of {}", index + 1, pages.len(), path.display());
            texts.push(self.ocr.recognize(page)?);
        }

        Ok(ExtractedText {
            text: texts.join("\n"),
            page_count: pages.len() as i64,
        })
    }
}

/// Decodes every frame (IFD) of a TIFF file in order.
pub fn decode_pages(bytes: &[u8]) -> Result<Vec<DynamicImage>, ExtractError> {
    let mut decoder = Decoder::new(Cursor::new(bytes)).map_err(decode_error)?;

    let mut pages = Vec::new();
    loop {
        pages.push(decode_frame(&mut decoder)?);
        if !decoder.more_images() {
            break;
        }
        decoder.next_image().map_err(decode_error)?;
    }
    Ok(pages)
}

fn decode_frame<R: Read + Seek>(decoder: &mut Decoder<R>) -> Result<DynamicImage, ExtractError> {
    let (width, height) = decoder.dimensions().map_err(decode_error)?;
    let color = decoder.colortype().map_err(decode_error)?;
    let white_is_zero =
        decoder.get_tag_u32(Tag::PhotometricInterpretation).ok() == Some(WHITE_IS_ZERO);
    let data = decoder.read_image().map_err(decode_error)?;

    let page = match (color, data) {
        (ColorType::Gray(1), DecodingResult::U8(buf)) => Some(DynamicImage::ImageLuma8(
            unpack_bilevel(&buf, width, height, white_is_zero),
        )),
        (ColorType::Gray(8), DecodingResult::U8(buf)) => {
            GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        (ColorType::Gray(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageLuma16)
        }
        (ColorType::RGB(8), DecodingResult::U8(buf)) => {
            RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => {
            RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        (other, _) => {
            return Err(ExtractError::Image(format!(
                "Unsupported TIFF color type {:?}",
                other
            )))
        }
    };

    page.ok_or_else(|| {
        ExtractError::Image(format!(
            "TIFF frame data does not match its {}x{} dimensions",
            width, height
        ))
    })
}

/// Expands 1-bit rows (each padded to a whole byte) into 8-bit grayscale.
fn unpack_bilevel(packed: &[u8], width: u32, height: u32, white_is_zero: bool) -> GrayImage {
    let stride = (width as usize).div_ceil(8);
    GrayImage::from_fn(width, height, |x, y| {
        let byte = packed
            .get(y as usize * stride + x as usize / 8)
            .copied()
            .unwrap_or(0);
        let set = (byte >> (7 - x % 8)) & 1 == 1;
        Luma([if set != white_is_zero { 255 } else { 0 }])
    })
}

fn decode_error(e: tiff::TiffError) -> ExtractError {
    ExtractError::Image(format!("Failed to decode TIFF: {}", e))
}
