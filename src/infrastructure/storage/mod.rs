pub mod file;
pub mod memory;

use std::sync::Arc;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::StorageArc;
use crate::domain::models::StorageName;

pub struct StorageManager {}

impl StorageManager {
    pub fn get(name: StorageName) -> Result<StorageArc> {
        if name == StorageName::File {
            return Ok(Arc::<file::FileStorage>::default());
        }

        if name == StorageName::Memory {
            return Ok(Arc::<memory::MemoryStorage>::default());
        }

        bail!(format!("No storage implemented for {name}"))
    }
}
