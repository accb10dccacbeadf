//! Test harness for isolated intake, watcher and review tests.
//!
//! The extractor reads each file as UTF-8 so fixtures are plain text with a
//! `.pdf` or `.tif` name. The generator answers categorization prompts with
//! a scripted response and summary prompts with a fixed summary.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use faxdesk::error::{ExtractError, GenerationError};
use faxdesk::watcher::FileProbe;
use faxdesk::{
    Database, ExtractedText, Extractor, FolderWatcher, IntakeProcessor, ReviewWorkflow,
    TextGenerator, WatcherOptions,
};

pub const SUMMARY: &str = "Fax summary.";

/// Extractor returning the file content as text.
#[derive(Default)]
pub struct EchoExtractor {
    missing_tool: Mutex<HashSet<String>>,
}

impl EchoExtractor {
    /// Files with this name fail as if the OCR engine were missing.
    pub fn fail_tool_for(&self, filename: &str) {
        self.missing_tool.lock().unwrap().insert(filename.to_string());
    }
}

impl Extractor for EchoExtractor {
    fn extract(&self, path: &Path) -> Result<ExtractedText, ExtractError> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        if self.missing_tool.lock().unwrap().contains(&name) {
            return Err(ExtractError::ToolUnavailable {
                tool: "Tesseract OCR".to_string(),
                remediation: "install tesseract".to_string(),
            });
        }

        let text = std::fs::read_to_string(path).map_err(|e| ExtractError::ReadDocument {
            path: path.to_path_buf(),
            source: e,
        })?;
        Ok(ExtractedText {
            text,
            page_count: 1,
        })
    }
}

/// Generator with a replaceable categorization response.
pub struct ScriptedGenerator {
    response: Mutex<Result<String, String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    pub fn new(response: &str) -> Self {
        Self {
            response: Mutex::new(Ok(response.to_string())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn respond_with(&self, response: &str) {
        *self.response.lock().unwrap() = Ok(response.to_string());
    }

    /// Every call fails as if the service were unreachable.
    pub fn fail(&self) {
        *self.response.lock().unwrap() = Err("http://localhost:11434".to_string());
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl TextGenerator for ScriptedGenerator {
    fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &*self.response.lock().unwrap() {
            Err(url) => Err(GenerationError::Connection(url.clone())),
            Ok(_) if !prompt.contains("STRICT JSON") => Ok(SUMMARY.to_string()),
            Ok(response) => Ok(response.clone()),
        }
    }
}

/// Probe that replays scripted sizes before falling back to the file system.
#[derive(Default)]
pub struct ScriptedProbe {
    sizes: Mutex<HashMap<PathBuf, VecDeque<u64>>>,
}

impl ScriptedProbe {
    /// The next `sizes.len()` samples for `path` return these values.
    pub fn script(&self, path: &Path, sizes: &[u64]) {
        self.sizes
            .lock()
            .unwrap()
            .entry(path.to_path_buf())
            .or_default()
            .extend(sizes.iter().copied());
    }
}

impl FileProbe for ScriptedProbe {
    fn size(&self, path: &Path) -> Option<u64> {
        if let Some(queue) = self.sizes.lock().unwrap().get_mut(path) {
            if let Some(size) = queue.pop_front() {
                return Some(size);
            }
        }
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    fn readable(&self, path: &Path) -> bool {
        std::fs::File::open(path).is_ok()
    }

    fn settle(&self) {}
}

/// Isolated environment: temp watch folder, in-memory database and
/// scripted collaborators.
pub struct TestHarness {
    temp_dir: TempDir,
    pub watch_dir: PathBuf,
    pub db: Database,
    pub extractor: Arc<EchoExtractor>,
    pub generator: Arc<ScriptedGenerator>,
    pub probe: Arc<ScriptedProbe>,
    pub intake: Arc<IntakeProcessor>,
}

impl TestHarness {
    /// Harness whose generator categorizes everything as a billing document.
    pub fn new() -> Self {
        Self::with_response(r#"{"category": "billing", "confidence": 0.9, "reason": "Invoice"}"#)
    }

    pub fn with_response(response: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let watch_dir = temp_dir.path().join("inbox");
        std::fs::create_dir_all(&watch_dir).expect("Failed to create watch dir");

        let db = Database::open_in_memory().expect("Failed to open database");
        let extractor = Arc::new(EchoExtractor::default());
        let generator = Arc::new(ScriptedGenerator::new(response));
        let intake = Arc::new(IntakeProcessor::new(
            db.clone(),
            extractor.clone(),
            generator.clone(),
        ));

        Self {
            temp_dir,
            watch_dir,
            db,
            extractor,
            generator,
            probe: Arc::new(ScriptedProbe::default()),
            intake,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes a fixture into the watch folder.
    pub fn write_fax(&self, filename: &str, text: &str) -> PathBuf {
        let path = self.watch_dir.join(filename);
        std::fs::write(&path, text).expect("Failed to write fax");
        path
    }

    /// Writes a fixture outside the watch folder.
    pub fn write_upload(&self, filename: &str, text: &str) -> PathBuf {
        let path = self.temp_dir.path().join(filename);
        std::fs::write(&path, text).expect("Failed to write upload");
        path
    }

    pub fn processed_dir(&self) -> PathBuf {
        self.watch_dir.join("processed")
    }

    pub fn review(&self) -> ReviewWorkflow {
        ReviewWorkflow::new(self.db.clone())
    }

    pub fn watcher(&self) -> FolderWatcher {
        self.watcher_with_interval(Duration::from_secs(10))
    }

    pub fn watcher_with_interval(&self, interval: Duration) -> FolderWatcher {
        let mut options = WatcherOptions::new(&self.watch_dir);
        options.scan_interval = interval;
        options.stop_timeout = Duration::from_secs(5);
        FolderWatcher::new(options, self.intake.clone(), self.probe.clone())
    }

    /// Ingests `text` under `filename` through the manual path.
    pub fn ingest(&self, filename: &str, text: &str) -> faxdesk::IntakeOutcome {
        let path = self.write_upload(filename, text);
        self.intake.ingest_file(&path).expect("ingest failed")
    }

    /// Ingests a fax and returns its id.
    pub fn ingest_id(&self, filename: &str, text: &str) -> i64 {
        self.ingest(filename, text)
            .record()
            .expect("expected a new record")
            .id
    }
}
