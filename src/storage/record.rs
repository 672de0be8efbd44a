/// Placing stored records back into a container
use tracing::{debug, warn};

use super::{Storage, StoredRecord};
use crate::container::{check_shape, set_path, AttributePath, Container};
use crate::error::CacheError;
use crate::logging::{operations, status};

/// Load-time policy
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Warn about and skip missing values instead of failing
    pub skip: bool,
    /// Warn when a loaded value replaces one already in the container
    pub verbose: bool,
}

/// What a load did to the container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub restored: Vec<AttributePath>,
    pub skipped: Vec<AttributePath>,
    pub overwritten: Vec<AttributePath>,
}

/// Read record `name` and write every stored value into `container`
///
/// Returns `Ok(None)` when no such record exists.
pub fn load_into(
    storage: &dyn Storage,
    container: &mut dyn Container,
    name: &str,
    options: LoadOptions,
) -> Result<Option<LoadReport>, CacheError> {
    let Some(record) = storage.get(name)? else {
        return Ok(None);
    };

    place(container, record, options).map(Some)
}

/// Write the entries of `record` into `container`, in order
pub fn place(
    container: &mut dyn Container,
    record: StoredRecord,
    options: LoadOptions,
) -> Result<LoadReport, CacheError> {
    let mut report = LoadReport::default();

    for (path, value) in record.entries {
        let Some(value) = value else {
            let err = CacheError::MissingCachedValue {
                category: path.category,
                keys: path.keys.clone(),
            };
            if !options.skip {
                return Err(err);
            }
            warn!(
                operation = operations::LOAD,
                status = status::SKIPPED,
                path = %path,
                "{}. Skipping",
                err
            );
            report.skipped.push(path);
            continue;
        };

        check_shape(&*container, &path, &value)?;
        if set_path(container, &path, value)?.is_some() {
            if options.verbose {
                warn!(operation = operations::LOAD, path = %path, "`{}` already exists, overwriting", path);
            }
            report.overwritten.push(path.clone());
        }

        debug!(operation = operations::LOAD, path = %path, "value restored");
        report.restored.push(path);
    }

    Ok(report)
}
