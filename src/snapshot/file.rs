//! Single-file persistence for snapshots.

use super::schema::{export_snapshot, import_snapshot};
use crate::error::{CoreError, Result};
use crate::workspace::AppState;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Snapshot file configuration.
#[derive(Clone, Debug)]
pub struct SnapshotConfig {
    /// Path of the snapshot file.
    pub path: PathBuf,

    /// Whether to create the parent directory if it doesn't exist.
    pub create_if_missing: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./draftwright.json"),
            create_if_missing: true,
        }
    }
}

/// An exclusively locked snapshot file.
///
/// Saves replace the file atomically by writing a sibling temp file and
/// renaming it into place.
pub struct SnapshotFile {
    config: SnapshotConfig,

    /// Lock file for exclusive access.
    _lock_file: File,

    write_lock: Mutex<()>,
}

impl SnapshotFile {
    /// Take the lock for `config.path`. Fails with `Locked` if another
    /// handle holds it.
    pub fn open(config: SnapshotConfig) -> Result<Self> {
        if let Some(parent) = config.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.exists() {
                if !config.create_if_missing {
                    return Err(CoreError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("snapshot directory {} does not exist", parent.display()),
                    )));
                }
                fs::create_dir_all(parent)?;
            }
        }

        let lock_file = Self::acquire_lock(&config.path)?;
        debug!(path = %config.path.display(), "snapshot file locked");

        Ok(Self {
            config,
            _lock_file: lock_file,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Read and normalize the stored snapshot. `None` if nothing was saved
    /// yet.
    pub fn load(&self) -> Result<Option<AppState>> {
        let raw = match fs::read_to_string(&self.config.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let state = import_snapshot(&raw)?;
        info!(path = %self.config.path.display(), "snapshot loaded");
        Ok(Some(state))
    }

    /// The stored state, or a fresh one when nothing was saved yet.
    pub fn load_or_default(&self) -> Result<AppState> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Write `state` in the current schema.
    pub fn save(&self, state: &AppState) -> Result<()> {
        let raw = export_snapshot(state)?;
        let _guard = self.write_lock.lock();

        let tmp_path = self.sibling("tmp");
        if let Err(err) = Self::replace_with(&tmp_path, &self.config.path, raw.as_bytes()) {
            if let Err(cleanup) = fs::remove_file(&tmp_path) {
                warn!(path = %tmp_path.display(), error = %cleanup, "leftover temp snapshot");
            }
            return Err(err);
        }

        debug!(path = %self.config.path.display(), bytes = raw.len(), "snapshot saved");
        Ok(())
    }

    fn replace_with(tmp_path: &Path, target: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        fs::rename(tmp_path, target)?;
        Ok(())
    }

    fn sibling(&self, extension: &str) -> PathBuf {
        Self::sibling_of(&self.config.path, extension)
    }

    fn sibling_of(path: &Path, extension: &str) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(extension);
        PathBuf::from(name)
    }

    fn acquire_lock(path: &Path) -> Result<File> {
        let lock_file = File::create(Self::sibling_of(path, "lock"))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| CoreError::Locked)?;

        Ok(lock_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(dir: &TempDir) -> SnapshotConfig {
        SnapshotConfig {
            path: dir.path().join("state").join("snapshot.json"),
            create_if_missing: true,
        }
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::open(test_config(&dir)).unwrap();
        assert!(file.load().unwrap().is_none());
        assert_eq!(file.load_or_default().unwrap().document_count(), 1);
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::open(test_config(&dir)).unwrap();

        let mut state = AppState::new();
        state.update_content("persist me").unwrap();
        state.commit("saved").unwrap();
        file.save(&state).unwrap();

        assert_eq!(file.load().unwrap(), Some(state));
        assert!(!SnapshotFile::sibling_of(file.path(), "tmp").exists());
    }

    #[test]
    fn test_failed_save_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::open(test_config(&dir)).unwrap();
        fs::create_dir(file.path()).unwrap();
        fs::write(file.path().join("occupied"), "x").unwrap();

        assert!(matches!(file.save(&AppState::new()), Err(CoreError::Io(_))));
        assert!(!SnapshotFile::sibling_of(file.path(), "tmp").exists());
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = TempDir::new().unwrap();
        let _first = SnapshotFile::open(test_config(&dir)).unwrap();
        assert!(matches!(
            SnapshotFile::open(test_config(&dir)),
            Err(CoreError::Locked)
        ));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        drop(SnapshotFile::open(test_config(&dir)).unwrap());
        assert!(SnapshotFile::open(test_config(&dir)).is_ok());
    }

    #[test]
    fn test_missing_directory_without_create() {
        let dir = TempDir::new().unwrap();
        let config = SnapshotConfig {
            create_if_missing: false,
            ..test_config(&dir)
        };
        assert!(matches!(SnapshotFile::open(config), Err(CoreError::Io(_))));
    }

    #[test]
    fn test_corrupt_file_reports_invalid_json() {
        let dir = TempDir::new().unwrap();
        let file = SnapshotFile::open(test_config(&dir)).unwrap();
        fs::write(file.path(), "not json").unwrap();
        assert!(matches!(file.load(), Err(CoreError::InvalidJson(_))));
    }
}
