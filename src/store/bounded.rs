use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{SettingKey, Settings, SubscriptionId};

use super::error::{Result, StoreError};
use super::line::Line;
use super::lines::{LineStore, write_lines};

/// Maximum number of most recent lines persisted on save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionLimit {
    Unbounded,
    Lines(usize),
}

/// A [`LineStore`] whose saved output is capped by an integer setting
///
/// The limit is looked up in [`Settings`] on every save. When the setting is
/// changed to `0` the backing file is deleted right away; saves at limit `0`
/// write nothing. In-memory lines are never truncated.
///
/// Change notifications and `save` are expected to be called one after the
/// other, never concurrently.
pub struct BoundedLineStore<L> {
    inner: LineStore<L>,
    settings: Arc<Settings>,
    limit: Option<SettingKey>,
    subscription: Option<SubscriptionId>,
}

impl<L: Line> BoundedLineStore<L> {
    /// Load `path` and, if `limit` is set, watch that setting for changes
    pub fn open<P: AsRef<Path>>(
        path: P,
        settings: Arc<Settings>,
        limit: Option<SettingKey>,
    ) -> Result<Self> {
        let inner = LineStore::open(path)?;

        let subscription = limit.as_ref().map(|key| {
            let path = inner.path().to_path_buf();
            let watched = key.clone();
            settings.subscribe(key.clone(), move |settings, changed| {
                if let Err(e) = cleanup_file(settings, &watched, changed, &path) {
                    warn!(error = %e, path = %path.display(), "Failed to clean up line file");
                }
            })
        });

        Ok(Self {
            inner,
            settings,
            limit,
            subscription,
        })
    }

    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    pub fn lines(&self) -> &[L] {
        self.inner.lines()
    }

    pub fn lines_mut(&mut self) -> &mut Vec<L> {
        self.inner.lines_mut()
    }

    pub fn inner(&self) -> &LineStore<L> {
        &self.inner
    }

    pub fn limit_key(&self) -> Option<&SettingKey> {
        self.limit.as_ref()
    }

    /// Resolve the current limit from settings
    pub fn limit(&self) -> Result<RetentionLimit> {
        match &self.limit {
            None => Ok(RetentionLimit::Unbounded),
            Some(key) => resolve_limit(&self.settings, key).map(RetentionLimit::Lines),
        }
    }

    /// Delete the backing file if `changed` is our limit and it is now `0`
    ///
    /// Returns whether a file was removed.
    pub fn on_config_changed(&self, changed: &SettingKey) -> Result<bool> {
        match &self.limit {
            Some(key) => cleanup_file(&self.settings, key, changed, self.inner.path()),
            None => Ok(false),
        }
    }

    /// Atomically write the last `limit` lines, or nothing at limit `0`
    pub fn save(&self) -> Result<()> {
        let lines = self.inner.lines();
        match self.limit()? {
            RetentionLimit::Unbounded => self.inner.save(),
            RetentionLimit::Lines(0) => {
                debug!(path = %self.path().display(), "Retention limit is 0, not saving");
                Ok(())
            }
            RetentionLimit::Lines(n) => {
                let start = lines.len().saturating_sub(n);
                write_lines(self.inner.path(), &lines[start..])
            }
        }
    }
}

impl<L> Drop for BoundedLineStore<L> {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.settings.unsubscribe(id);
        }
    }
}

impl<L: std::fmt::Debug> std::fmt::Debug for BoundedLineStore<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedLineStore")
            .field("inner", &self.inner)
            .field("limit", &self.limit)
            .finish()
    }
}

fn resolve_limit(settings: &Settings, key: &SettingKey) -> Result<usize> {
    let value = settings.get(key)?;
    usize::try_from(value).map_err(|_| StoreError::NegativeLimit {
        key: key.clone(),
        value,
    })
}

fn cleanup_file(
    settings: &Settings,
    limit: &SettingKey,
    changed: &SettingKey,
    path: &Path,
) -> Result<bool> {
    if changed != limit {
        return Ok(false);
    }
    if resolve_limit(settings, limit)? != 0 {
        return Ok(false);
    }

    match fs::remove_file(path) {
        Ok(()) => {
            info!(path = %path.display(), setting = %limit, "Retention limit set to 0, removed file");
            Ok(true)
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e.into()),
    }
}

/// Resolve `fname` against `dir` unless it is already absolute
pub fn resolve_path(dir: &Path, fname: &Path) -> PathBuf {
    if fname.is_absolute() {
        fname.to_path_buf()
    } else {
        dir.join(fname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn key() -> SettingKey {
        SettingKey::new("completion", "history_length")
    }

    fn settings(limit: i64) -> Arc<Settings> {
        Arc::new(Settings::from_values([(key(), limit)]))
    }

    fn numbered(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("line {i}")).collect()
    }

    #[test]
    fn test_save_keeps_last_n() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");

        let mut store = BoundedLineStore::<String>::open(&path, settings(3), Some(key())).unwrap();
        store.lines_mut().extend(numbered(5));
        store.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 2\nline 3\nline 4");
        assert_eq!(store.lines().len(), 5);
    }

    #[test]
    fn test_limit_above_len_saves_all() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");

        let mut store = BoundedLineStore::<String>::open(&path, settings(100), Some(key())).unwrap();
        store.lines_mut().extend(numbered(2));
        store.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 0\nline 1");
    }

    #[test]
    fn test_limit_read_at_save_time() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        let settings = settings(10);

        let mut store = BoundedLineStore::<String>::open(&path, Arc::clone(&settings), Some(key())).unwrap();
        store.lines_mut().extend(numbered(4));
        settings.set(&key(), 1);
        store.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "line 3");
        assert_eq!(store.limit().unwrap(), RetentionLimit::Lines(1));
    }

    #[test]
    fn test_zero_limit_save_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        fs::write(&path, "existing").unwrap();

        let mut store = BoundedLineStore::<String>::open(&path, settings(0), Some(key())).unwrap();
        store.lines_mut().push("new".to_string());
        store.save().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing");
        assert_eq!(store.lines(), &["existing", "new"]);
    }

    #[test]
    fn test_notification_to_zero_deletes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        fs::write(&path, "a\nb").unwrap();
        let settings = settings(5);

        let store = BoundedLineStore::<String>::open(&path, Arc::clone(&settings), Some(key())).unwrap();
        settings.set(&key(), 0);

        assert!(!path.exists());
        store.save().unwrap();
        assert!(!path.exists());
        assert_eq!(store.lines(), &["a", "b"]);
    }

    #[test]
    fn test_notification_to_nonzero_keeps_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        fs::write(&path, "a").unwrap();
        let settings = settings(5);

        let _store = BoundedLineStore::<String>::open(&path, Arc::clone(&settings), Some(key())).unwrap();
        settings.set(&key(), 2);
        settings.set(&SettingKey::new("other", "option"), 0);

        assert!(path.exists());
    }

    #[test]
    fn test_on_config_changed_ignores_other_keys() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        fs::write(&path, "a").unwrap();

        let store = BoundedLineStore::<String>::open(&path, settings(0), Some(key())).unwrap();

        assert!(!store.on_config_changed(&SettingKey::new("other", "option")).unwrap());
        assert!(path.exists());
        assert!(store.on_config_changed(&key()).unwrap());
        assert!(!path.exists());
        assert!(!store.on_config_changed(&key()).unwrap());
    }

    #[test]
    fn test_unbounded_saves_everything() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");

        let mut store = BoundedLineStore::<Vec<u8>>::open(&path, Arc::new(Settings::new()), None).unwrap();
        store.lines_mut().extend([b"x".to_vec(), b"y".to_vec()]);
        store.save().unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"x\ny");
        assert_eq!(store.limit().unwrap(), RetentionLimit::Unbounded);
        assert!(!store.on_config_changed(&key()).unwrap());
    }

    #[test]
    fn test_negative_limit_fails_fast() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        fs::write(&path, "keep").unwrap();

        let mut store = BoundedLineStore::<String>::open(&path, settings(-1), Some(key())).unwrap();
        store.lines_mut().push("more".to_string());

        assert!(matches!(store.save(), Err(StoreError::NegativeLimit { value: -1, .. })));
        assert!(matches!(store.on_config_changed(&key()), Err(StoreError::NegativeLimit { .. })));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");
    }

    #[test]
    fn test_unknown_limit_setting() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");

        let store = BoundedLineStore::<String>::open(&path, Arc::new(Settings::new()), Some(key())).unwrap();
        assert!(matches!(store.save(), Err(StoreError::Setting(_))));
    }

    #[test]
    fn test_drop_unsubscribes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history");
        let settings = settings(5);

        let store = BoundedLineStore::<String>::open(&path, Arc::clone(&settings), Some(key())).unwrap();
        assert_eq!(settings.subscriber_count(), 1);
        drop(store);
        assert_eq!(settings.subscriber_count(), 0);
    }

    #[test]
    fn test_resolve_path() {
        let dir = Path::new("/data");
        assert_eq!(resolve_path(dir, Path::new("history")), PathBuf::from("/data/history"));
        assert_eq!(resolve_path(dir, Path::new("/abs/file")), PathBuf::from("/abs/file"));
    }
}
