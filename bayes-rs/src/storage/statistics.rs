//! Persistent word statistics
//!
//! The model is a pair `[Totals, TokenTable]` written as one JSON document.
//! Saves go to a temporary file in the same directory which is then renamed
//! over the model file, so readers always see a complete generation. Writers
//! serialize on an exclusive advisory lock held on `<model>.lock`.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::lock::FileLock;
use crate::config::StorageConfig;
use crate::error::{BayesError, Result};
use crate::spam::types::{FeatureKey, ModelStats, TokenCounts, TokenLookup, TokenTable, Totals};

/// Owner of the on-disk model and its save-batching state.
///
/// Updates are flushed every `save_threshold` training calls and once more
/// by [`finish`](Self::finish). Up to `save_threshold - 1` updates are lost
/// if the process dies between flushes.
pub struct StatisticsStore {
    path: PathBuf,
    totals: Option<Totals>,
    tokens: Option<TokenTable>,
    pending: usize,
    save_threshold: usize,
    lock_timeout: Option<Duration>,
    flushes: u64,
}

impl StatisticsStore {
    /// Create a store for `path` with default batching and no lock timeout
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self::with_config(&StorageConfig {
            path: path.into(),
            ..StorageConfig::default()
        })
    }

    pub fn with_config(config: &StorageConfig) -> Self {
        Self {
            path: config.path.clone(),
            totals: None,
            tokens: None,
            pending: 0,
            save_threshold: config.save_threshold.max(1),
            lock_timeout: config.lock_timeout(),
            flushes: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn totals(&self) -> Option<Totals> {
        self.totals
    }

    pub fn tokens(&self) -> Option<&TokenTable> {
        self.tokens.as_ref()
    }

    /// Training calls not yet flushed to disk
    pub fn pending_updates(&self) -> usize {
        self.pending
    }

    pub fn save_threshold(&self) -> usize {
        self.save_threshold
    }

    /// Number of saves that actually wrote the model file
    pub fn flush_count(&self) -> u64 {
        self.flushes
    }

    /// True once both halves of the model hold data
    pub fn is_populated(&self) -> bool {
        self.totals.is_some() && self.tokens.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Read the model file, replacing the in-memory model.
    ///
    /// A missing file yields [`BayesError::NotFound`], which callers treat
    /// as an empty model.
    pub fn load(&mut self) -> Result<()> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(BayesError::NotFound(self.path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let (totals, tokens): (Totals, TokenTable) =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| {
                if source.is_io() {
                    BayesError::Io(source.into())
                } else {
                    BayesError::CorruptData {
                        path: self.path.clone(),
                        source,
                    }
                }
            })?;

        debug!(
            "Loaded model from {}: {} spam, {} ham, {} tokens",
            self.path.display(),
            totals.spam,
            totals.ham,
            tokens.len()
        );

        self.totals = Some(totals);
        self.tokens = Some(tokens);
        Ok(())
    }

    /// Write the model file under the exclusive lock.
    ///
    /// No-op while the model is unpopulated, so an untouched store never
    /// clobbers an existing file.
    pub fn save(&mut self) -> Result<()> {
        let (Some(totals), Some(tokens)) = (&self.totals, &self.tokens) else {
            debug!("Nothing to save to {}", self.path.display());
            return Ok(());
        };
        if tokens.is_empty() {
            debug!("Token table empty, not saving {}", self.path.display());
            return Ok(());
        }

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(dir)?;

        let _lock = FileLock::acquire(&self.lock_path(), self.lock_timeout)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer(&mut writer, &(totals, tokens))?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        info!(
            "Saved model to {} ({} messages, {} tokens)",
            self.path.display(),
            totals.messages(),
            tokens.len()
        );
        self.flushes += 1;
        Ok(())
    }

    /// Count one update and flush once `save_threshold` updates accumulate
    pub fn save_if_needed(&mut self) -> Result<()> {
        self.pending += 1;
        if self.pending >= self.save_threshold {
            self.save()?;
            self.pending = 0;
        }
        Ok(())
    }

    /// Flush any pending updates. Call once at shutdown.
    pub fn finish(&mut self) -> Result<()> {
        if self.pending > 0 {
            self.save()?;
            self.pending = 0;
        }
        Ok(())
    }

    /// Apply one training event: one totals increment plus one increment
    /// per key. Initializes the model on first use.
    pub fn record<I>(&mut self, keys: I, is_spam: bool)
    where
        I: IntoIterator<Item = FeatureKey>,
    {
        let totals = self.totals.get_or_insert_with(Totals::default);
        if is_spam {
            totals.spam += 1;
        } else {
            totals.ham += 1;
        }

        let tokens = self.tokens.get_or_insert_with(TokenTable::new);
        for key in keys {
            tokens
                .entry(key)
                .and_modify(|counts| counts.increment(is_spam))
                .or_insert_with(|| TokenCounts::first(is_spam));
        }
    }

    pub fn lookup(&self, key: FeatureKey) -> TokenLookup {
        match self.tokens.as_ref().and_then(|t| t.get(&key)) {
            Some(counts) => TokenLookup::Found(*counts),
            None => TokenLookup::NotFound,
        }
    }

    pub fn stats(&self) -> ModelStats {
        let totals = self.totals.unwrap_or_default();
        ModelStats {
            spam_messages: totals.spam,
            ham_messages: totals.ham,
            token_count: self.tokens.as_ref().map_or(0, |t| t.len()),
        }
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("bayes"));
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

impl Drop for StatisticsStore {
    fn drop(&mut self) {
        if self.pending > 0 {
            warn!(
                "Dropping model store with {} unsaved update(s) for {}",
                self.pending,
                self.path.display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir, threshold: usize) -> StatisticsStore {
        StatisticsStore::with_config(&StorageConfig {
            path: dir.path().join("model.json"),
            save_threshold: threshold,
            lock_timeout_ms: None,
        })
    }

    #[test]
    fn test_new_store_is_empty() {
        let store = StatisticsStore::new("/tmp/unused-model.json");
        assert!(store.totals().is_none());
        assert!(store.tokens().is_none());
        assert!(!store.is_populated());
        assert_eq!(store.save_threshold(), 5);
        assert_eq!(store.lookup(1), TokenLookup::NotFound);
    }

    #[test]
    fn test_record_initializes_and_counts() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 5);

        store.record([1, 2], true);
        store.record([2, 3], false);

        assert_eq!(store.totals(), Some(Totals { spam: 1, ham: 1 }));
        assert_eq!(store.lookup(1), TokenLookup::Found(TokenCounts { ham: 0, spam: 1 }));
        assert_eq!(store.lookup(2), TokenLookup::Found(TokenCounts { ham: 1, spam: 1 }));
        assert_eq!(store.lookup(3), TokenLookup::Found(TokenCounts { ham: 1, spam: 0 }));
        assert_eq!(store.lookup(4), TokenLookup::NotFound);
        assert_eq!(
            store.stats(),
            ModelStats {
                spam_messages: 1,
                ham_messages: 1,
                token_count: 3
            }
        );
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 5);

        let err = store.load().unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_load_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 5);
        fs::write(store.path(), b"{\"not\": \"a model\"}").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, BayesError::CorruptData { .. }));
    }

    #[test]
    fn test_save_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 30);
        store.record([10, u64::MAX], true);
        store.record([10, 0], false);
        store.save().unwrap();

        let mut reloaded = store_in(&temp_dir, 30);
        reloaded.load().unwrap();
        assert_eq!(reloaded.totals(), store.totals());
        assert_eq!(reloaded.tokens(), store.tokens());
    }

    #[test]
    fn test_save_unpopulated_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 5);
        fs::write(store.path(), b"keep me").unwrap();

        store.save().unwrap();

        assert_eq!(fs::read(store.path()).unwrap(), b"keep me");
        assert_eq!(store.flush_count(), 0);
    }

    #[test]
    fn test_save_with_empty_token_table_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 5);
        store.record(std::iter::empty(), true);

        store.save().unwrap();

        assert!(!store.path().exists());
        assert_eq!(store.flush_count(), 0);
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = StatisticsStore::new(temp_dir.path().join("nested/dir/model.json"));
        store.record([7], true);

        store.save().unwrap();

        assert!(store.path().exists());
        assert!(temp_dir.path().join("nested/dir/model.json.lock").exists());
    }

    #[test]
    fn test_save_if_needed_batches() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 4);
        store.record([1], true);

        for _ in 0..3 {
            store.save_if_needed().unwrap();
            assert_ne!(store.pending_updates(), 0, "saved prematurely");
        }
        assert_eq!(store.flush_count(), 0);

        store.save_if_needed().unwrap();
        assert_eq!(store.pending_updates(), 0);
        assert_eq!(store.flush_count(), 1);
    }

    #[test]
    fn test_save_if_needed_flush_count() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 3);
        store.record([1], false);

        for _ in 0..11 {
            store.save_if_needed().unwrap();
        }

        assert_eq!(store.flush_count(), 11 / 3);
        assert_eq!(store.pending_updates(), 11 % 3);
    }

    #[test]
    fn test_finish_flushes_pending() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 30);
        store.record([1], true);
        store.save_if_needed().unwrap();

        store.finish().unwrap();

        assert_eq!(store.pending_updates(), 0);
        assert_eq!(store.flush_count(), 1);
        assert!(store.path().exists());
    }

    #[test]
    fn test_finish_without_pending_does_not_save() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 30);
        store.record([1], true);

        store.finish().unwrap();

        assert_eq!(store.flush_count(), 0);
        assert!(!store.path().exists());
    }

    #[test]
    fn test_persisted_format() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = store_in(&temp_dir, 5);
        store.record([42], true);
        store.save().unwrap();

        let value: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{"spam": 1, "ham": 0}, {"42": {"ham": 0, "spam": 1}}])
        );
    }
}
