//! JSON file backend for native runs

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{PersistError, Store};

/// Stores every key in a single JSON object file.
///
/// Writes go to `<path>.tmp` first and are renamed over the target so a crash
/// mid-write leaves the previous file intact. A file that no longer parses is
/// moved to `<path>.bad` on the next write and replaced with a fresh object.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut path = self.path.clone().into_os_string();
        path.push(suffix);
        PathBuf::from(path)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PersistError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Store for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(PersistError::Json(e)) => {
                let backup = self.sibling(".bad");
                log::warn!(
                    "Discarding unreadable {} ({}), moved to {}",
                    self.path.display(),
                    e,
                    backup.display()
                );
                fs::rename(&self.path, &backup)?;
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        let json = serde_json::to_string_pretty(&entries)?;

        let tmp = self.sibling(".tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
