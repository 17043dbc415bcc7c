//! Atomic TOML file operations.
//!
//! Writes go through a temporary file, `fsync` and rename; read-modify-write
//! cycles hold an exclusive `fs2` lock on a sibling `.lock` file.

use notary_core::error::{NotaryError, Result};
use serde::{Serialize, de::DeserializeOwned};
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// A handle to one TOML file holding a `T`.
///
/// - **Atomicity**: a reader sees either the old or the new file, never a torn one
/// - **Isolation**: [`AtomicTomlFile::update`] serializes writers across processes
/// - **Durability**: data is synced before the rename
pub struct AtomicTomlFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicTomlFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads and deserializes the file.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: Successfully loaded and deserialized
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub fn load(&self) -> Result<Option<T>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }

        let data: T = toml::from_str(&content)?;
        Ok(Some(data))
    }

    /// Serializes `data` and replaces the file atomically.
    pub fn save(&self, data: &T) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let toml_string = toml::to_string_pretty(data)?;

        let tmp_path = self.temp_path()?;
        let mut tmp_file = File::create(&tmp_path)?;
        tmp_file.write_all(toml_string.as_bytes())?;
        tmp_file.sync_all()?;
        drop(tmp_file);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Read-modify-write under an exclusive file lock.
    ///
    /// `f` sees the current contents (or `default_value` when the file is
    /// missing). The file is rewritten only if `f` returns `Ok`; its output
    /// is passed back to the caller.
    pub fn update<F, R>(&self, default_value: T, f: F) -> Result<R>
    where
        F: FnOnce(&mut T) -> Result<R>,
    {
        let _lock = FileLock::acquire(&self.path)?;

        let mut data = self.load()?.unwrap_or(default_value);
        let output = f(&mut data)?;
        self.save(&data)?;

        Ok(output)
    }

    /// Removes the file if present.
    pub fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> Result<PathBuf> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| NotaryError::data_access("path has no parent directory"))?;
        let file_name = self
            .path
            .file_name()
            .ok_or_else(|| NotaryError::data_access("path has no file name"))?;

        Ok(parent.join(format!(".{}.tmp", file_name.to_string_lossy())))
    }
}

/// Exclusive lock guard; the lock is released when the file handle drops.
struct FileLock {
    _file: File,
    lock_path: PathBuf,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");
        if let Some(parent) = lock_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        #[cfg(unix)]
        {
            use fs2::FileExt;
            file.lock_exclusive().map_err(|e| {
                NotaryError::data_access(format!("Failed to acquire lock: {}", e))
            })?;
        }

        Ok(FileLock {
            _file: file,
            lock_path,
        })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Ledger {
        entries: Vec<String>,
    }

    #[test]
    fn test_load_missing_or_empty_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.toml");
        let file = AtomicTomlFile::<Ledger>::new(path.clone());
        assert!(file.load().unwrap().is_none());

        fs::write(&path, "  \n").unwrap();
        assert!(file.load().unwrap().is_none());
    }

    #[test]
    fn test_save_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("ledger.toml");
        let file = AtomicTomlFile::<Ledger>::new(path.clone());

        file.save(&Ledger {
            entries: vec!["a".into()],
        })
        .unwrap();

        assert!(path.exists());
        assert!(!temp_dir.path().join("nested").join(".ledger.toml.tmp").exists());
        assert_eq!(file.load().unwrap().unwrap().entries, vec!["a".to_string()]);
    }

    #[test]
    fn test_update_returns_closure_output_and_skips_write_on_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicTomlFile::<Ledger>::new(temp_dir.path().join("ledger.toml"));
        let empty = Ledger { entries: vec![] };

        let len = file
            .update(empty.clone(), |ledger| {
                ledger.entries.push("first".into());
                Ok(ledger.entries.len())
            })
            .unwrap();
        assert_eq!(len, 1);

        let err = file
            .update(empty, |ledger| {
                ledger.entries.push("second".into());
                Err::<(), _>(NotaryError::internal("abort"))
            })
            .unwrap_err();
        assert_eq!(err, NotaryError::internal("abort"));
        assert_eq!(file.load().unwrap().unwrap().entries, vec!["first".to_string()]);
        assert!(!temp_dir.path().join("ledger.lock").exists());
    }

    #[test]
    fn test_corrupt_file_is_serialization_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ledger.toml");
        fs::write(&path, "entries = [").unwrap();

        let err = AtomicTomlFile::<Ledger>::new(path).load().unwrap_err();
        assert!(matches!(err, NotaryError::Serialization { .. }));
    }
}
