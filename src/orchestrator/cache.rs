use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::{run, CallArgs, CallOptions, Outcome};
use crate::config::CacheConfig;
use crate::container::Container;
use crate::error::CacheError;
use crate::logging::{operations, status};
use crate::rule::{CacheRule, Group};
use crate::storage::{Codec, FilesystemStorage, Storage, StorageStats};

/// Record storage for every rule group
///
/// With separate directories each group lives in its own subdirectory of the
/// root (`pp/`, `tl/`, `pl/`); otherwise all groups share the root.
#[derive(Debug, Clone)]
pub struct Cache {
    root: PathBuf,
    separate_dirs: bool,
    pp: FilesystemStorage,
    tl: FilesystemStorage,
    pl: FilesystemStorage,
}

impl Cache {
    pub fn from_config(config: &CacheConfig) -> Result<Self, CacheError> {
        Self::open(
            config.root_dir(),
            Codec::from_name(&config.backend)?,
            config.ext.clone(),
            config.separate_dirs,
            config.make_dir,
        )
    }

    pub fn open(
        root: PathBuf,
        codec: Codec,
        ext: Option<String>,
        separate_dirs: bool,
        make_dir: bool,
    ) -> Result<Self, CacheError> {
        if !make_dir && !root.is_dir() {
            return Err(CacheError::config(format!(
                "Cache directory `{}` does not exist and `make_dir` is disabled",
                root.display()
            )));
        }

        let backend = |group: Group| -> Result<FilesystemStorage, CacheError> {
            let dir = if separate_dirs {
                root.join(group.name())
            } else {
                root.clone()
            };
            if !make_dir && !dir.is_dir() {
                return Err(CacheError::config(format!(
                    "Cache directory `{}` does not exist and `make_dir` is disabled",
                    dir.display()
                )));
            }
            Ok(FilesystemStorage::new(dir, codec, ext.clone(), make_dir)?)
        };

        let cache = Self {
            pp: backend(Group::Pp)?,
            tl: backend(Group::Tl)?,
            pl: backend(Group::Pl)?,
            root: root.clone(),
            separate_dirs,
        };

        debug!(
            root = %cache.root.display(),
            separate_dirs,
            backend = codec.name(),
            "cache opened"
        );

        Ok(cache)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn separate_dirs(&self) -> bool {
        self.separate_dirs
    }

    pub fn storage(&self, group: Group) -> &FilesystemStorage {
        match group {
            Group::Pp => &self.pp,
            Group::Tl => &self.tl,
            Group::Pl => &self.pl,
        }
    }

    /// Distinct backends for `group`, or for every group when `None`
    pub fn backends(&self, group: Option<Group>) -> Vec<(Group, &FilesystemStorage)> {
        let groups: Vec<Group> = match group {
            Some(group) => vec![group],
            None if self.separate_dirs => Group::ALL.to_vec(),
            // One shared directory
            None => vec![Group::Tl],
        };

        groups.into_iter().map(|g| (g, self.storage(g))).collect()
    }

    /// Run one cached call in the rule's group storage
    pub fn run<C: Container + Clone>(
        &self,
        rule: &CacheRule<C>,
        container: &mut C,
        args: &CallArgs,
        options: &CallOptions<C>,
    ) -> Result<Outcome<C>, CacheError> {
        run(self.storage(rule.group()), rule, container, args, options)
    }

    /// Delete every record file of `group`, or of all groups
    ///
    /// Returns the removed paths; with a shared directory every group's files
    /// are removed.
    pub fn clear(&self, group: Option<Group>) -> Result<Vec<PathBuf>, CacheError> {
        let mut removed = Vec::new();

        for (group, storage) in self.backends(group) {
            let paths = storage.clear()?;
            debug!(
                operation = operations::CLEAR,
                group = %group,
                count = paths.len(),
                "group cleared"
            );
            removed.extend(paths);
        }

        info!(
            operation = operations::CLEAR,
            status = status::SUCCESS,
            count = removed.len(),
            "Removed {} cached records",
            removed.len()
        );

        Ok(removed)
    }

    /// Record file names per group
    pub fn list(&self, group: Option<Group>) -> Result<Vec<(Group, Vec<String>)>, CacheError> {
        self.backends(group)
            .into_iter()
            .map(|(group, storage)| Ok((group, storage.list()?)))
            .collect()
    }

    pub fn stats(&self, group: Option<Group>) -> Result<Vec<(Group, StorageStats)>, CacheError> {
        self.backends(group)
            .into_iter()
            .map(|(group, storage)| Ok((group, storage.stats()?)))
            .collect()
    }
}
