use crate::error::{BayesError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Exclusive advisory lock held until dropped
pub(crate) struct FileLock {
    file: File,
    path: PathBuf,
}

impl FileLock {
    /// Lock `path`, creating it if needed.
    ///
    /// Blocks indefinitely when `timeout` is `None`.
    pub(crate) fn acquire(path: &Path, timeout: Option<Duration>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match timeout {
            None => FileExt::lock_exclusive(&file)?,
            Some(timeout) => Self::lock_within(&file, path, timeout)?,
        }

        debug!("Acquired lock {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    fn lock_within(file: &File, path: &Path, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut contended = false;

        loop {
            match FileExt::try_lock_exclusive(file) {
                Ok(()) => return Ok(()),
                Err(e) if e.kind() == fs2::lock_contended_error().kind() => {
                    if !contended {
                        warn!("Lock {} is held by another process, waiting", path.display());
                        contended = true;
                    }
                    if Instant::now() >= deadline {
                        return Err(BayesError::LockTimeout {
                            path: path.to_path_buf(),
                            timeout,
                        });
                    }
                    std::thread::sleep(LOCK_POLL_INTERVAL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            warn!("Failed to release lock {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_acquire_creates_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json.lock");

        let lock = FileLock::acquire(&path, None).unwrap();
        assert!(path.exists());
        drop(lock);
    }

    #[test]
    fn test_contended_lock_times_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json.lock");

        // A second handle on the same file contends with the first
        let holder = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .unwrap();
        FileExt::lock_exclusive(&holder).unwrap();

        let result = FileLock::acquire(&path, Some(Duration::from_millis(60)));
        assert!(matches!(result, Err(BayesError::LockTimeout { .. })));

        FileExt::unlock(&holder).unwrap();
        assert!(FileLock::acquire(&path, Some(Duration::from_millis(60))).is_ok());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("model.json.lock");

        {
            let _lock = FileLock::acquire(&path, None).unwrap();
        }

        let lock = FileLock::acquire(&path, Some(Duration::from_millis(60)));
        assert!(lock.is_ok());
    }
}
