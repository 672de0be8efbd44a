use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Codec, Storage, StorageStats, StoredRecord};
use crate::logging::operations;

/// Directory of record files sharing one codec and extension
///
/// Layout: `<dir>/<name><ext>`, one file per cached result.
#[derive(Debug, Clone)]
pub struct FilesystemStorage {
    dir: PathBuf,
    ext: String,
    codec: Codec,
}

impl FilesystemStorage {
    /// Open a storage directory, creating it when `make_dir` is set
    pub fn new<P: AsRef<Path>>(
        dir: P,
        codec: Codec,
        ext: Option<String>,
        make_dir: bool,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        if !dir.exists() {
            if !make_dir {
                anyhow::bail!("Cache directory does not exist: {}", dir.display());
            }
            fs::create_dir_all(&dir).with_context(|| {
                format!("Failed to create cache directory: {}", dir.display())
            })?;
        }

        let ext = ext.unwrap_or_else(|| codec.default_extension().to_string());

        Ok(Self { dir, ext, codec })
    }

    pub fn codec(&self) -> Codec {
        self.codec
    }
}

impl Storage for FilesystemStorage {
    fn dir(&self) -> &Path {
        &self.dir
    }

    fn extension(&self) -> &str {
        &self.ext
    }

    fn put(&self, name: &str, record: &StoredRecord) -> Result<()> {
        let path = self.path_of(name);
        let bytes = self.codec.encode(record)?;

        // Write to a temp file in the same directory, then rename over the target
        let mut file = tempfile::NamedTempFile::new_in(&self.dir)
            .with_context(|| format!("Failed to create temp file in {}", self.dir.display()))?;
        file.write_all(&bytes).context("Failed to write record")?;
        file.as_file().sync_all().context("Failed to sync record")?;
        file.persist(&path)
            .with_context(|| format!("Failed to persist record: {}", path.display()))?;

        debug!(
            operation = operations::SAVE,
            file = %path.display(),
            entry_count = record.len(),
            size_bytes = bytes.len(),
            "record written"
        );

        Ok(())
    }

    fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
        let path = self.path_of(name);

        if !path.is_file() {
            return Ok(None);
        }

        let bytes =
            fs::read(&path).with_context(|| format!("Failed to read record: {}", path.display()))?;
        let record = self
            .codec
            .decode(&bytes)
            .with_context(|| format!("Corrupt record file: {}", path.display()))?;

        Ok(Some(record))
    }

    fn exists(&self, name: &str) -> Result<bool> {
        Ok(self.path_of(name).is_file())
    }

    fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_of(name);

        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete record: {}", path.display()))?;
        }

        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let pattern = format!(
            "{}/*{}",
            glob::Pattern::escape(&self.dir.to_string_lossy()),
            glob::Pattern::escape(&self.ext)
        );

        let mut names = Vec::new();
        for entry in glob::glob(&pattern).context("Invalid record file pattern")? {
            let path = entry?;
            if !path.is_file() {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }

    fn clear(&self) -> Result<Vec<PathBuf>> {
        let mut removed = Vec::new();

        for name in self.list()? {
            let path = self.dir.join(&name);
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete record: {}", path.display()))?;
            debug!(operation = operations::CLEAR, file = %path.display(), "record deleted");
            removed.push(path);
        }

        Ok(removed)
    }

    fn stats(&self) -> Result<StorageStats> {
        let mut total_records = 0u64;
        let mut total_bytes = 0u64;

        for name in self.list()? {
            let metadata = fs::metadata(self.dir.join(&name))?;
            total_records += 1;
            total_bytes += metadata.len();
        }

        Ok(StorageStats {
            total_records,
            total_bytes,
            cache_dir: self.dir.clone(),
        })
    }
}
