use anyhow::Result;
use dashmap::DashMap;

use crate::domain::models::Storage;

/// Storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
    items: DashMap<String, String>,
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        return self.items.get(key).map(|val| return val.to_string());
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        return Ok(());
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items.remove(key);
        return Ok(());
    }
}
