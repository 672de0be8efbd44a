pub mod cache_dir;
pub mod codec;
pub mod filesystem;
pub mod record;

pub use cache_dir::{default_cache_dir, expand_home};
pub use codec::Codec;
pub use filesystem::FilesystemStorage;
pub use record::{load_into, LoadOptions, LoadReport};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::container::{AttributePath, Value};

/// One stored `(path, value)` pair; `None` marks a value that failed to cache
pub type StoredEntry = (AttributePath, Option<Value>);

/// Ordered entries persisted as one record file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredRecord {
    pub entries: Vec<StoredEntry>,
}

impl StoredRecord {
    pub fn push(&mut self, path: AttributePath, value: Option<Value>) {
        self.entries.push((path, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &AttributePath> {
        self.entries.iter().map(|(path, _)| path)
    }
}

/// Storage backend for named record files
///
/// Names are file names relative to the backend directory; the backend's
/// extension is appended when missing.
pub trait Storage {
    fn dir(&self) -> &Path;

    fn extension(&self) -> &str;

    /// File name for `name`, with the extension appended if not already present
    fn file_name(&self, name: &str) -> String {
        if name.ends_with(self.extension()) {
            name.to_string()
        } else {
            format!("{}{}", name, self.extension())
        }
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.dir().join(self.file_name(name))
    }

    /// Write a record, replacing any existing file
    fn put(&self, name: &str, record: &StoredRecord) -> Result<()>;

    /// Read a record back
    fn get(&self, name: &str) -> Result<Option<StoredRecord>>;

    fn exists(&self, name: &str) -> Result<bool>;

    fn delete(&self, name: &str) -> Result<()>;

    /// File names of all records, sorted
    fn list(&self) -> Result<Vec<String>>;

    /// Remove every record file, returning the removed paths
    fn clear(&self) -> Result<Vec<PathBuf>>;

    fn stats(&self) -> Result<StorageStats>;
}

/// Storage statistics
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub total_records: u64,
    pub total_bytes: u64,
    pub cache_dir: PathBuf,
}
