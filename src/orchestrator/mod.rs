//! Cached call orchestration
//!
//! [`run`] decides for one call whether a rule's values are restored from its
//! record file or computed and saved:
//!
//! ```text
//! force ──────────────────────────────► compute ─► save ─► Saved
//! record exists ─► load ─► Loaded
//! otherwise ─► compute (or collect only when `call` is off) ─► save ─► Saved
//! ```
//!
//! Plot rules hand back the captured image on both terminal states and never
//! leave the transient plot key in the container, even when the call fails.
//! Rules declaring a return attribute hand back its value; otherwise a
//! computing call hands back whatever the computation returned.

pub mod cache;
pub mod options;
pub mod plot;

pub use cache::Cache;
pub use options::{CallArgs, CallOptions, Outcome};
pub use plot::{Renderer, TMP_PLOT_KEY};

use tracing::{debug, info, warn};

use crate::container::{category_exists, get_path, Container, Value};
use crate::error::CacheError;
use crate::logging::{operations, status};
use crate::resolve::{resolve, ResolveContext};
use crate::rule::CacheRule;
use crate::storage::{load_into, LoadOptions, Storage, StoredRecord};

/// Progress message, `info` when the call is verbose and `debug` otherwise
macro_rules! progress {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            info!($($arg)+);
        } else {
            debug!($($arg)+);
        }
    };
}

enum Step {
    Loaded,
    /// Carries the computation's return value, if any
    Saved(Option<Value>),
}

/// Run one cached call of `rule` against `container`
pub fn run<C: Container + Clone>(
    storage: &dyn Storage,
    rule: &CacheRule<C>,
    container: &mut C,
    args: &CallArgs,
    options: &CallOptions<C>,
) -> Result<Outcome<C>, CacheError> {
    let copy = options.copy && !rule.is_plot();
    if options.copy && rule.is_plot() {
        debug!(rule = rule.name(), "copy is ignored for plot rules");
    }

    let fname = storage.file_name(options.fname.as_deref().unwrap_or(rule.default_fname()));

    let mut duplicate = copy.then(|| container.clone());
    let executed = {
        let target: &mut C = match duplicate.as_mut() {
            Some(duplicate) => duplicate,
            None => &mut *container,
        };
        execute(storage, rule, target, &fname, args, options)
    };

    let step = match executed {
        Ok(step) => step,
        Err(e) => {
            if rule.is_plot() {
                plot::discard(container);
            }
            return Err(e);
        }
    };

    if rule.is_plot() {
        let image = plot::take_image(container, rule.name())?;
        debug!(rule = rule.name(), width = image.width, height = image.height, "plot captured");
        return Ok(Outcome::Image(image));
    }

    if let Some(path) = rule.returns() {
        let source: &dyn Container = match duplicate.as_ref() {
            Some(duplicate) => duplicate,
            None => &*container,
        };
        let value = get_path(source, path).cloned().ok_or_else(|| {
            CacheError::InternalConsistency {
                rule: rule.name().to_string(),
                reason: format!("return attribute `{}` is missing", path),
            }
        })?;
        return Ok(Outcome::Value(value));
    }

    match (step, duplicate) {
        (_, Some(duplicate)) => Ok(Outcome::Container(duplicate)),
        (Step::Saved(Some(value)), None) => Ok(Outcome::Value(value)),
        (Step::Loaded | Step::Saved(None), None) => Ok(Outcome::Nothing),
    }
}

fn execute<C: Container>(
    storage: &dyn Storage,
    rule: &CacheRule<C>,
    target: &mut C,
    fname: &str,
    args: &CallArgs,
    options: &CallOptions<C>,
) -> Result<Step, CacheError> {
    if options.force {
        if !options.call {
            warn!(
                rule = rule.name(),
                "`call=false` has no effect together with `force=true`, recomputing"
            );
        }
        progress!(
            options.verbose,
            operation = operations::COMPUTE,
            status = status::FORCED,
            rule = rule.name(),
            "Recomputing values, forced"
        );
        let result = compute(rule, target, args, options)?;
        save(storage, rule, target, fname, args, options)?;
        return Ok(Step::Saved(result));
    }

    if storage.exists(fname)? {
        progress!(
            options.verbose,
            operation = operations::LOAD,
            status = status::SUCCESS,
            rule = rule.name(),
            file = fname,
            "Loading data from: `{}`",
            storage.path_of(fname).display()
        );
        let load_options = LoadOptions {
            skip: options.skip,
            verbose: options.verbose,
        };
        load_into(storage, target, fname, load_options)?;
        return Ok(Step::Loaded);
    }

    let mut result = None;
    if options.call {
        progress!(
            options.verbose,
            operation = operations::COMPUTE,
            status = status::MISS,
            rule = rule.name(),
            file = fname,
            "No cache found in `{}`, computing values",
            storage.path_of(fname).display()
        );
        result = compute(rule, target, args, options)?;
    } else {
        progress!(
            options.verbose,
            operation = operations::COMPUTE,
            status = status::MISS,
            rule = rule.name(),
            file = fname,
            "No cache found in `{}`, caching the values already present",
            storage.path_of(fname).display()
        );
    }

    save(storage, rule, target, fname, args, options)?;
    Ok(Step::Saved(result))
}

fn compute<C>(
    rule: &CacheRule<C>,
    target: &mut C,
    args: &CallArgs,
    options: &CallOptions<C>,
) -> Result<Option<Value>, CacheError> {
    let Some(callback) = options.callback.as_ref().or(rule.default_fn()) else {
        debug!(rule = rule.name(), "no computation bound, reading values from the container");
        return Ok(None);
    };

    callback(target, args).map_err(|e| CacheError::Computation {
        rule: rule.name().to_string(),
        message: format!("{:#}", e),
    })
}

/// Mandatory save after a computation
///
/// Ambiguities and configuration errors are left for the caller to fix with a
/// hint; anything else means the computation did not produce what the rule
/// declares.
fn save<C>(
    storage: &dyn Storage,
    rule: &CacheRule<C>,
    container: &dyn Container,
    fname: &str,
    args: &CallArgs,
    options: &CallOptions<C>,
) -> Result<StoredRecord, CacheError> {
    let inconsistent = |reason: String| CacheError::InternalConsistency {
        rule: rule.name().to_string(),
        reason,
    };

    let record = collect(rule, container, args, options).map_err(|e| match e {
        CacheError::AmbiguousKeyMatch { .. } | CacheError::Configuration(_) => e,
        other => inconsistent(other.to_string()),
    })?;

    storage
        .put(fname, &record)
        .map_err(|e| inconsistent(format!("{:#}", e)))?;

    progress!(
        options.verbose,
        operation = operations::SAVE,
        status = status::SUCCESS,
        rule = rule.name(),
        file = fname,
        entry_count = record.len(),
        "Caching data to: `{}`",
        storage.path_of(fname).display()
    );

    Ok(record)
}

/// Gather the current values of every attribute `rule` declares
///
/// Absent optional categories and keys are left out. With `skip`, missing
/// keys are reported as warnings and left out as well.
pub fn collect<C>(
    rule: &CacheRule<C>,
    container: &dyn Container,
    args: &CallArgs,
    options: &CallOptions<C>,
) -> Result<StoredRecord, CacheError> {
    let possible_values = args.possible_values();
    let hint = options.hint.as_ref().or(rule.hint());
    let mut record = StoredRecord::default();

    for entry in rule.entries() {
        if !category_exists(container, entry.category) {
            if entry.optional {
                debug!(rule = rule.name(), category = %entry.category, "optional attribute absent");
                continue;
            }
            return Err(CacheError::AttributeMissing {
                category: entry.category,
            });
        }

        let ctx = ResolveContext {
            container,
            possible_values: &possible_values,
            optional: entry.optional,
            aliases: rule.aliases(),
            hint,
        };

        let paths = match resolve(entry.category, &entry.key, &ctx) {
            Ok(resolution) => resolution.into_paths(),
            Err(e) if options.skip && e.is_skippable() => {
                warn!(operation = operations::RESOLVE, status = status::SKIPPED, rule = rule.name(), "{}", e);
                continue;
            }
            Err(e) => return Err(e),
        };

        for path in paths {
            match get_path(container, &path) {
                Some(value) => record.push(path, Some(value.clone())),
                None if entry.optional => {
                    debug!(rule = rule.name(), path = %path, "optional key absent");
                }
                None => {
                    let err = CacheError::KeyNotFound {
                        category: path.category,
                        keys: path.keys.clone(),
                    };
                    if !options.skip {
                        return Err(err);
                    }
                    warn!(operation = operations::SAVE, status = status::SKIPPED, rule = rule.name(), "{}", err);
                }
            }
        }
    }

    Ok(record)
}
