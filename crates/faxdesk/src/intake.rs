//! Intake of a single document: dedup, extraction, categorization,
//! urgency scoring, summarization and persistence.

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::categorizer::Categorizer;
use crate::db::{fax_repo, Database};
use crate::error::{ExtractError, IntakeError};
use crate::fax::{FaxRecord, FaxStatus, NewFax};
use crate::generation::TextGenerator;
use crate::processor::{self, ExtractedText, Extractor};
use crate::urgency;

/// Result of taking in one file.
#[derive(Debug, Clone)]
pub enum IntakeOutcome {
    Created(FaxRecord),
    /// Identical content was ingested before; nothing was stored.
    Duplicate { content_hash: String },
}

impl IntakeOutcome {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }

    pub fn record(&self) -> Option<&FaxRecord> {
        match self {
            Self::Created(record) => Some(record),
            Self::Duplicate { .. } => None,
        }
    }
}

/// SHA-256 of the file content as lowercase hex.
pub fn hash_file(path: &Path) -> Result<String, IntakeError> {
    let content = std::fs::read(path).map_err(|e| IntakeError::Hash {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(format!("{:x}", Sha256::digest(&content)))
}

pub struct IntakeProcessor {
    db: Database,
    extractor: Arc<dyn Extractor>,
    categorizer: Categorizer,
}

impl IntakeProcessor {
    pub fn new(
        db: Database,
        extractor: Arc<dyn Extractor>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            db,
            extractor,
            categorizer: Categorizer::new(generator),
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Manual ingestion path: rejects unsupported extensions, then runs
    /// [`process_file`](Self::process_file) under the file's own name.
    pub fn ingest_file(&self, path: &Path) -> Result<IntakeOutcome, IntakeError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_string();

        if !processor::is_supported(path) {
            return Err(IntakeError::UnsupportedFile(name));
        }

        self.process_file(path, &name)
    }

    /// Runs the full intake pipeline for one readable file.
    ///
    /// A missing extraction tool aborts the file. Every other extraction
    /// failure is logged and the file is stored as `pending` with empty text.
    pub fn process_file(
        &self,
        path: &Path,
        display_name: &str,
    ) -> Result<IntakeOutcome, IntakeError> {
        let _span = tracing::info_span!("intake", file = %display_name).entered();

        let content_hash = {
            let _s = tracing::info_span!("hash").entered();
            hash_file(path)?
        };

        if fax_repo::find_by_hash(&self.db, &content_hash)?.is_some() {
            log::info!("Skipping duplicate {} ({})", display_name, content_hash);
            return Ok(IntakeOutcome::Duplicate { content_hash });
        }

        let (extracted, status) = {
            let _s = tracing::info_span!("extract").entered();
            match self.extractor.extract(path) {
                Ok(extracted) => (extracted, FaxStatus::Categorized),
                Err(e) if must_abort(&e) => return Err(e.into()),
                Err(e) => {
                    log::warn!("Extraction failed for {}: {}", display_name, e);
                    (
                        ExtractedText {
                            text: String::new(),
                            page_count: 1,
                        },
                        FaxStatus::Pending,
                    )
                }
            }
        };

        let categorization = {
            let _s = tracing::info_span!("categorize").entered();
            self.categorizer.categorize(&extracted.text)
        };

        let urgency = {
            let _s = tracing::info_span!("urgency").entered();
            urgency::score(&extracted.text, categorization.category)
        };

        let summary = {
            let _s = tracing::info_span!("summarize").entered();
            self.categorizer.summarize(&extracted.text)
        };

        let now = Utc::now();
        let new_fax = NewFax {
            filename: display_name.to_string(),
            source_path: path.to_string_lossy().into_owned(),
            content_hash: content_hash.clone(),
            status,
            ai_category: categorization.category,
            ai_confidence: categorization.confidence,
            ai_reason: categorization.reason,
            raw_text: extracted.text,
            summary,
            page_count: extracted.page_count,
            is_urgent: urgency.is_urgent,
            priority_score: urgency.priority,
            received_at: now,
            processed_at: now,
        };

        let _s = tracing::info_span!("persist").entered();
        match fax_repo::insert(&self.db, &new_fax) {
            Ok(record) => {
                log::info!(
                    "Stored fax {} as {} ({:.2}, priority {})",
                    record.id,
                    categorization.category,
                    new_fax.ai_confidence,
                    record.priority_score
                );
                Ok(IntakeOutcome::Created(record))
            }
            Err(e) if e.is_unique_violation() => {
                log::info!("Duplicate {} detected on insert", display_name);
                Ok(IntakeOutcome::Duplicate { content_hash })
            }
            Err(e) => Err(e.into()),
        }
    }
}

fn must_abort(err: &ExtractError) -> bool {
    matches!(
        err,
        ExtractError::ToolUnavailable { .. } | ExtractError::ReadDocument { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::fax::FaxCategory;

    struct FixedExtractor(Result<&'static str, fn() -> ExtractError>);

    impl Extractor for FixedExtractor {
        fn extract(&self, _path: &Path) -> Result<ExtractedText, ExtractError> {
            match &self.0 {
                Ok(text) => Ok(ExtractedText {
                    text: text.to_string(),
                    page_count: 3,
                }),
                Err(make) => Err(make()),
            }
        }
    }

    struct FixedGenerator(&'static str);

    impl TextGenerator for FixedGenerator {
        fn generate(&self, _prompt: &str, _max: u32) -> Result<String, GenerationError> {
            Ok(self.0.to_string())
        }
    }

    const REFERRAL: &str = "Referral to cardiology for Mr. Smith, follow-up on \
                            abnormal ECG findings from last week.";

    fn processor(extractor: FixedExtractor) -> IntakeProcessor {
        IntakeProcessor::new(
            Database::open_in_memory().unwrap(),
            Arc::new(extractor),
            Arc::new(FixedGenerator(
                r#"{"category": "referrals", "confidence": 0.9, "reason": "Cardiology referral"}"#,
            )),
        )
    }

    fn write(dir: &Path, name: &str, content: &[u8]) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_hash_is_hex_sha256() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "a.pdf", b"abc");
        assert_eq!(
            hash_file(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_creates_categorized_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "ref.pdf", b"%PDF referral");
        let intake = processor(FixedExtractor(Ok(REFERRAL)));

        let outcome = intake.process_file(&path, "ref.pdf").unwrap();
        let record = outcome.record().unwrap();

        assert_eq!(record.status, FaxStatus::Categorized);
        assert_eq!(record.ai_category, Some(FaxCategory::Referrals));
        assert_eq!(record.ai_confidence, Some(0.9));
        assert_eq!(record.page_count, 3);
        assert_eq!(record.priority_score, 55);
        assert!(!record.is_urgent);
        assert_eq!(record.received_at, record.processed_at.unwrap());
        assert_eq!(record.filename, "ref.pdf");
    }

    #[test]
    fn test_same_content_is_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let first = write(dir.path(), "a.pdf", b"same bytes");
        let second = write(dir.path(), "b.pdf", b"same bytes");
        let intake = processor(FixedExtractor(Ok(REFERRAL)));

        assert!(!intake.process_file(&first, "a.pdf").unwrap().is_duplicate());
        assert!(intake.process_file(&second, "b.pdf").unwrap().is_duplicate());

        let (_, total) = fax_repo::query(intake.database(), &Default::default()).unwrap();
        assert_eq!(total, 1);
    }

    #[test]
    fn test_tool_unavailable_aborts() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "scan.tif", b"tiff");
        let intake = processor(FixedExtractor(Err(|| ExtractError::ToolUnavailable {
            tool: "Tesseract OCR".to_string(),
            remediation: "install tesseract".to_string(),
        })));

        let err = intake.process_file(&path, "scan.tif").unwrap_err();
        assert!(err.to_string().contains("install tesseract"));
        let (_, total) = fax_repo::query(intake.database(), &Default::default()).unwrap();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_extraction_failure_degrades_to_pending() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.pdf", b"broken");
        let intake = processor(FixedExtractor(Err(|| ExtractError::Pdf("bad xref".into()))));

        let outcome = intake.process_file(&path, "bad.pdf").unwrap();
        let record = outcome.record().unwrap();
        assert_eq!(record.status, FaxStatus::Pending);
        assert_eq!(record.ai_category, Some(FaxCategory::Unknown));
        assert_eq!(record.ai_confidence, Some(0.3));
        assert_eq!(record.text_length, 0);
    }

    #[test]
    fn test_ingest_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "notes.txt", b"hello");
        let intake = processor(FixedExtractor(Ok(REFERRAL)));

        let err = intake.ingest_file(&path).unwrap_err();
        assert!(matches!(err, IntakeError::UnsupportedFile(name) if name == "notes.txt"));
    }

    #[test]
    fn test_missing_file_is_hash_error() {
        let intake = processor(FixedExtractor(Ok(REFERRAL)));
        let err = intake
            .process_file(Path::new("/nonexistent/x.pdf"), "x.pdf")
            .unwrap_err();
        assert!(matches!(err, IntakeError::Hash { .. }));
    }
}
