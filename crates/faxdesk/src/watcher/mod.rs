//! Folder watcher: polls the watch folder and feeds ready files to intake.
//!
//! A single background thread runs a current-thread tokio runtime with an
//! interval timer. Ticks are strictly serialized; a manual scan only runs
//! while the loop is stopped. Stop is cooperative and waits a bounded time
//! for the tick in flight.

pub mod scanner;
pub mod stability;
pub mod state;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::Utc;
use crossbeam_channel::RecvTimeoutError;
use serde::Serialize;
use tokio::sync::{broadcast, Notify};

use crate::error::WatcherError;
use crate::fax::FaxRecord;
use crate::intake::{IntakeOutcome, IntakeProcessor};
use crate::storage::FileStorage;

pub use stability::{FileProbe, FsProbe};
pub use state::{ErrorLog, WatcherState, WatcherStatus};

const EVENT_CAPACITY: usize = 64;

/// `tokio::time::interval` panics on a zero period.
const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

/// Emitted for every file a tick handles.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WatcherEvent {
    Processed { record: FaxRecord },
    Duplicate { filename: String, content_hash: String },
    Failed { filename: String, error: String },
}

/// Counts for one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub found: usize,
    pub processed: usize,
    pub duplicates: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct WatcherOptions {
    pub watch_folder: PathBuf,
    pub scan_interval: Duration,
    pub stop_timeout: Duration,
}

impl WatcherOptions {
    pub fn new<P: AsRef<Path>>(watch_folder: P) -> Self {
        Self {
            watch_folder: watch_folder.as_ref().to_path_buf(),
            scan_interval: Duration::from_secs(10),
            stop_timeout: Duration::from_secs(5),
        }
    }
}

struct WatcherInner {
    intake: Arc<IntakeProcessor>,
    probe: Arc<dyn FileProbe>,
    storage: FileStorage,
    watch_folder: PathBuf,
    state: Mutex<WatcherState>,
    tick_lock: Mutex<()>,
    events: broadcast::Sender<WatcherEvent>,
}

struct Worker {
    handle: JoinHandle<()>,
    done: crossbeam_channel::Receiver<()>,
    shutdown: Arc<AtomicBool>,
    wake: Arc<Notify>,
}

pub struct FolderWatcher {
    inner: Arc<WatcherInner>,
    scan_interval: Duration,
    stop_timeout: Duration,
    worker: Mutex<Option<Worker>>,
}

impl FolderWatcher {
    pub fn new(
        options: WatcherOptions,
        intake: Arc<IntakeProcessor>,
        probe: Arc<dyn FileProbe>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(WatcherInner {
                intake,
                probe,
                storage: FileStorage::new(&options.watch_folder),
                watch_folder: options.watch_folder,
                state: Mutex::new(WatcherState::default()),
                tick_lock: Mutex::new(()),
                events,
            }),
            scan_interval: options.scan_interval.max(MIN_SCAN_INTERVAL),
            stop_timeout: options.stop_timeout,
            worker: Mutex::new(None),
        }
    }

    pub fn watch_folder(&self) -> &Path {
        &self.inner.watch_folder
    }

    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WatcherEvent> {
        self.inner.events.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.inner.state().is_running
    }

    pub fn status(&self) -> WatcherStatus {
        self.inner
            .state()
            .snapshot(self.inner.watch_folder.clone())
    }

    /// Starts the polling loop. Calling it while running does nothing.
    ///
    /// The watch folder is created when missing; if that fails the error is
    /// recorded in the error log and returned.
    pub fn start(&self) -> Result<(), WatcherError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if self.is_running() {
            log::warn!("Watcher is already running");
            return Ok(());
        }

        let folder = &self.inner.watch_folder;
        if !folder.exists() {
            if let Err(e) = std::fs::create_dir_all(folder) {
                let message = format!("Failed to create watch folder: {}", e);
                log::error!("{}", message);
                self.inner.state().errors.push(message);
                return Err(WatcherError::CreateFolder {
                    path: folder.clone(),
                    source: e,
                });
            }
            log::info!("Created watch folder: {}", folder.display());
        }

        let shutdown = Arc::new(AtomicBool::new(false));
        let wake = Arc::new(Notify::new());
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(1);

        let inner = Arc::clone(&self.inner);
        let thread_shutdown = Arc::clone(&shutdown);
        let thread_wake = Arc::clone(&wake);
        let interval = self.scan_interval;

        self.inner.state().is_running = true;

        let spawned = std::thread::Builder::new()
            .name("fax-watcher".to_string())
            .spawn(move || {
                run_loop(&inner, interval, &thread_shutdown, &thread_wake);
                let _ = done_tx.send(());
            });

        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.inner.state().is_running = false;
                return Err(WatcherError::SpawnFailed(e.to_string()));
            }
        };

        *worker = Some(Worker {
            handle,
            done: done_rx,
            shutdown,
            wake,
        });

        log::info!("Started watching folder: {}", folder.display());
        Ok(())
    }

    /// Signals the loop to stop and waits up to the stop timeout for the
    /// tick in flight. Returns false when the wait timed out. Calling it
    /// while stopped does nothing.
    pub fn stop(&self) -> bool {
        let worker = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(worker) = worker else {
            return true;
        };

        worker.shutdown.store(true, Ordering::Release);
        worker.wake.notify_one();

        let finished = match worker.done.recv_timeout(self.stop_timeout) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    log::error!("Watcher thread panicked");
                }
                true
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "Watcher did not stop within {:?}; leaving the current tick to finish",
                    self.stop_timeout
                );
                false
            }
        };

        self.inner.state().is_running = false;
        log::info!("Stopped folder watcher");
        finished
    }

    /// Runs one scan synchronously when the loop is stopped. While the loop
    /// runs this is a no-op and returns `None`; the next tick covers it.
    pub fn manual_scan(&self) -> Option<ScanReport> {
        if self.is_running() {
            log::debug!("Manual scan skipped: watcher is running");
            return None;
        }
        Some(self.inner.run_tick())
    }
}

impl Drop for FolderWatcher {
    fn drop(&mut self) {
        let worker = self
            .worker
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(worker) = worker {
            worker.shutdown.store(true, Ordering::Release);
            worker.wake.notify_one();
        }
    }
}

fn run_loop(inner: &WatcherInner, interval: Duration, shutdown: &AtomicBool, wake: &Notify) {
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            let message = format!("Failed to start watcher runtime: {}", e);
            log::error!("{}", message);
            let mut state = inner.state();
            state.errors.push(message);
            state.is_running = false;
            return;
        }
    };

    let mut timer = rt.block_on(async {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        timer
    });

    loop {
        rt.block_on(async {
            tokio::select! {
                _ = timer.tick() => {},
                _ = wake.notified() => {},
            }
        });

        if shutdown.load(Ordering::Acquire) {
            break;
        }

        // Ticks run outside the runtime: intake uses blocking HTTP.
        inner.run_tick();
    }
}

impl WatcherInner {
    fn state(&self) -> MutexGuard<'_, WatcherState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self, message: String) {
        log::error!("{}", message);
        self.state().errors.push(message);
    }

    fn run_tick(&self) -> ScanReport {
        let _tick = self.tick_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let _span = tracing::info_span!("watcher.tick").entered();

        let mut report = ScanReport::default();
        if !self.watch_folder.exists() {
            return report;
        }

        self.state().last_scan_at = Some(Utc::now());

        let candidates = match scanner::list_candidates(&self.watch_folder) {
            Ok(candidates) => candidates,
            Err(e) => {
                self.record_error(format!("Error during folder scan: {}", e));
                return report;
            }
        };

        let ready: Vec<PathBuf> = candidates
            .into_iter()
            .filter(|path| !self.state().processed_files.contains(path))
            .filter(|path| stability::is_ready(self.probe.as_ref(), path))
            .collect();

        report.found = ready.len();
        self.state().files_in_queue = ready.len();

        for path in &ready {
            self.process_one(path, &mut report);
        }

        if report.found > 0 {
            log::info!(
                "Scan finished: {} processed, {} duplicates, {} failed",
                report.processed,
                report.duplicates,
                report.failed
            );
        }
        report
    }

    fn process_one(&self, path: &Path, report: &mut ScanReport) {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        log::info!("Processing new fax: {}", name);
        self.state().currently_processing_file = Some(name.clone());

        let event = match self.intake.process_file(path, &name) {
            Ok(IntakeOutcome::Created(record)) => {
                report.processed += 1;
                self.state().processed_count += 1;
                if let Err(e) = self.storage.move_to_processed(path) {
                    log::warn!("Could not move {} to processed folder: {}", name, e);
                    self.state().processed_files.insert(path.to_path_buf());
                }
                WatcherEvent::Processed { record }
            }
            Ok(IntakeOutcome::Duplicate { content_hash }) => {
                report.duplicates += 1;
                log::info!("Skipped duplicate fax: {}", name);
                let mut state = self.state();
                state.processed_count += 1;
                state.processed_files.insert(path.to_path_buf());
                drop(state);
                WatcherEvent::Duplicate {
                    filename: name.clone(),
                    content_hash,
                }
            }
            Err(e) => {
                report.failed += 1;
                self.record_error(format!("Error processing {}: {}", name, e));
                WatcherEvent::Failed {
                    filename: name.clone(),
                    error: e.to_string(),
                }
            }
        };

        self.state().currently_processing_file = None;
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}
