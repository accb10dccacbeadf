//! Two-sample size check that keeps half-written files out of intake.

use std::io::Read;
use std::path::Path;
use std::time::Duration;

/// Default pause between the two size samples.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// File system access used by the stability check.
pub trait FileProbe: Send + Sync {
    /// Current size in bytes, `None` when the file cannot be inspected.
    fn size(&self, path: &Path) -> Option<u64>;
    /// Whether the file can be opened and read.
    fn readable(&self, path: &Path) -> bool;
    /// Waits between the two size samples.
    fn settle(&self);
}

/// Probe backed by the real file system.
#[derive(Debug, Clone)]
pub struct FsProbe {
    delay: Duration,
}

impl FsProbe {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for FsProbe {
    fn default() -> Self {
        Self::new(DEFAULT_SETTLE_DELAY)
    }
}

impl FileProbe for FsProbe {
    fn size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|m| m.len())
    }

    fn readable(&self, path: &Path) -> bool {
        let mut buf = [0u8; 1];
        std::fs::File::open(path)
            .and_then(|mut f| f.read(&mut buf))
            .is_ok()
    }

    fn settle(&self) {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
    }
}

/// True when the size is equal across two samples taken `settle` apart and
/// the file can be read.
pub fn is_ready(probe: &dyn FileProbe, path: &Path) -> bool {
    let Some(first) = probe.size(path) else {
        return false;
    };
    probe.settle();
    let Some(second) = probe.size(path) else {
        return false;
    };

    if first != second {
        log::debug!(
            "{} still growing ({} -> {} bytes)",
            path.display(),
            first,
            second
        );
        return false;
    }

    probe.readable(path)
}
