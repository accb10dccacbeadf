use std::sync::Arc;

use faxdesk::watcher::FsProbe;
use faxdesk::{
    Database, DisabledGenerator, DocumentExtractor, FolderWatcher, IntakeProcessor,
    OllamaGenerator, ReviewWorkflow, ServiceConfig, SettingsStore, TextGenerator, WatcherOptions,
};

use crate::error::CliResult;

/// Services built once from the resolved config and shared by all commands.
pub struct App {
    pub config: ServiceConfig,
    pub db: Database,
    pub settings: SettingsStore,
    pub review: ReviewWorkflow,
    pub intake: Arc<IntakeProcessor>,
}

impl App {
    pub fn new(config: ServiceConfig) -> CliResult<Self> {
        let db = Database::open(&config.database_path)?;

        let generator: Arc<dyn TextGenerator> = if config.generation.enabled {
            Arc::new(OllamaGenerator::new(
                &config.generation.base_url,
                &config.generation.model,
                config.generation.timeout_secs,
            )?)
        } else {
            log::info!("Text generation disabled; categorization uses defaults");
            Arc::new(DisabledGenerator)
        };

        let extractor = Arc::new(DocumentExtractor::new(&config.ocr.languages));
        let intake = Arc::new(IntakeProcessor::new(db.clone(), extractor, generator));

        Ok(Self {
            settings: SettingsStore::new(db.clone())
                .with_default_watch_folder(config.watch_folder.clone()),
            review: ReviewWorkflow::new(db.clone()),
            intake,
            db,
            config,
        })
    }

    /// Watcher over the folder the settings resolve to right now.
    pub fn watcher(&self) -> CliResult<FolderWatcher> {
        let mut options = WatcherOptions::new(self.settings.watch_folder()?);
        options.scan_interval = self.config.scan_interval();
        options.stop_timeout = self.config.stop_timeout();

        Ok(FolderWatcher::new(
            options,
            Arc::clone(&self.intake),
            Arc::new(FsProbe::new(self.config.stability_delay())),
        ))
    }
}
