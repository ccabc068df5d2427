//! Filesystem implementation of the `KeyValueStore` trait.
//!
//! Each key is stored as `<dir>/<key>.json`. Writes land in a uniquely named
//! sibling temporary file first and are renamed into place, so a crash
//! mid-write leaves the previous record intact and concurrent writers never
//! share a temporary file.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use treasure_core::error::GameError;
use treasure_core::store::KeyValueStore;

/// A `KeyValueStore` that keeps one JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a store rooted at `dir`. The directory is created on first
    /// write.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the directory holding the record files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Maps a key to its record file.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Persistence` if the key is empty or contains
    /// anything but ASCII alphanumerics, `_`, `-` and `.`, or starts with `.`.
    fn path_for(&self, key: &str) -> Result<PathBuf, GameError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(GameError::Persistence(format!("invalid store key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> GameError {
    GameError::Persistence(format!("failed to {action} {}: {err}", path.display()))
}

fn write_atomically(dir: &Path, target: &Path, contents: &str) -> Result<(), GameError> {
    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".json.tmp")
        .tempfile_in(dir)
        .map_err(|e| io_error("create temporary file in", dir, &e))?;
    tmp.write_all(contents.as_bytes())
        .and_then(|()| tmp.as_file().sync_all())
        .map_err(|e| io_error("write", tmp.path(), &e))?;
    tmp.persist(target)
        .map_err(|e| io_error("replace", target, &e.error))?;
    Ok(())
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, GameError> {
        let path = self.path_for(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("read", &path, &e)),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), GameError> {
        let path = self.path_for(key)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error("create", &self.dir, &e))?;

        let dir = self.dir.clone();
        let target = path.clone();
        let contents = value.to_owned();
        tokio::task::spawn_blocking(move || write_atomically(&dir, &target, &contents))
            .await
            .map_err(|e| GameError::Persistence(format!("write task failed: {e}")))??;

        debug!(path = %path.display(), bytes = value.len(), "record written");
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), GameError> {
        let path = self.path_for(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("remove", &path, &e)),
        }
    }
}
