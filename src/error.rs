use thiserror::Error;

use crate::container::Category;

/// Errors raised while resolving, saving, loading or computing cached attributes
#[derive(Error, Debug)]
pub enum CacheError {
    /// Unknown backend or category, malformed rule declaration, invalid pattern
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Container has no attribute `{category}` and it was not specified as optional")]
    AttributeMissing { category: Category },

    #[error(
        "Found ambiguous matches for `{pattern}` in `{category}`: `{}`. \
         Try specifying a key hint to filter them out",
        .candidates.join("`, `")
    )]
    AmbiguousKeyMatch {
        category: Category,
        pattern: String,
        candidates: Vec<String>,
    },

    #[error("Unable to find keys `{}` in `{category}`. Use `skip` to skip them", .keys.join(", "))]
    KeyNotFound { category: Category, keys: Vec<String> },

    #[error(
        "Cache contains empty value for attribute `{category}`, key `{}`. \
         This could have happened when caching these values failed. Use `skip` to skip them",
        .keys.join(", ")
    )]
    MissingCachedValue { category: Category, keys: Vec<String> },

    #[error("Cached value for `{path}` is {found}, but the container expects {expected}")]
    ShapeMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Caching the values of `{rule}` failed: {reason}")]
    InternalConsistency { rule: String, reason: String },

    #[error("Computation for `{rule}` failed: {message}")]
    Computation { rule: String, message: String },

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl CacheError {
    pub fn config(message: impl Into<String>) -> Self {
        CacheError::Configuration(message.into())
    }

    /// Whether `skip` is allowed to turn this error into a warning
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            CacheError::KeyNotFound { .. } | CacheError::MissingCachedValue { .. }
        )
    }
}

pub type Result<T, E = CacheError> = std::result::Result<T, E>;
