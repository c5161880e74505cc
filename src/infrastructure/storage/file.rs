#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::fs;
use std::path;

use anyhow::Result;

use crate::configuration::Config;
use crate::domain::models::Storage;

/// Keeps each key in its own file under a directory, so every run of the
/// client on this machine sees the same session.
pub struct FileStorage {
    pub dir: path::PathBuf,
}

impl Default for FileStorage {
    fn default() -> FileStorage {
        return FileStorage::new(Config::storage_dir());
    }
}

impl FileStorage {
    pub fn new(dir: path::PathBuf) -> FileStorage {
        return FileStorage { dir };
    }

    fn get_file_path(&self, key: &str) -> path::PathBuf {
        return self.dir.join(key);
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let file_path = self.get_file_path(key);
        if !file_path.exists() {
            return None;
        }

        match fs::read_to_string(&file_path) {
            Ok(val) => return Some(val),
            Err(err) => {
                tracing::warn!(error = ?err, key = key, "Failed to read storage item");
                return None;
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir)?;
        }

        fs::write(self.get_file_path(key), value)?;
        return Ok(());
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        let file_path = self.get_file_path(key);
        if !file_path.exists() {
            return Ok(());
        }

        fs::remove_file(file_path)?;
        return Ok(());
    }
}
