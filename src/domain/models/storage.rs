use std::sync::Arc;

use anyhow::Result;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Flat string key/value storage that outlives a single run, the same way a
/// browser profile keeps local storage between tabs and reloads.
pub trait Storage {
    fn get_item(&self, key: &str) -> Option<String>;

    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Removing a key that does not exist is not an error.
    fn remove_item(&self, key: &str) -> Result<()>;
}

pub type StorageArc = Arc<dyn Storage + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StorageName {
    File,
    Memory,
}

impl StorageName {
    pub fn parse(text: String) -> Option<StorageName> {
        return StorageName::iter().find(|e| return e.to_string() == text);
    }
}
