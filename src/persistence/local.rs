//! Browser LocalStorage backend

use super::{PersistError, Store};

/// LocalStorage of the current window
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    fn storage() -> Result<web_sys::Storage, PersistError> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .ok_or_else(|| PersistError::Unavailable("no LocalStorage on window".to_string()))
    }
}

impl Store for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, PersistError> {
        Self::storage()?
            .get_item(key)
            .map_err(|e| PersistError::Unavailable(format!("{:?}", e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        Self::storage()?
            .set_item(key, value)
            .map_err(|e| PersistError::Unavailable(format!("{:?}", e)))
    }
}
