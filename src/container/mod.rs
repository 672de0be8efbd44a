pub mod access;
pub mod category;
pub mod memory;
pub mod value;

pub use access::{category_exists, category_keys, get_path, remove_path, set_path};
pub use category::{strip_repeat_suffix, Category, CategoryKind};
pub use memory::AnnotatedData;
pub use value::{Mapping, Matrix, Raster, Value};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CacheError;

/// Structured data container the cache reads from and writes into
///
/// Implementations only need to expose raw category storage; nested key
/// descent and on-demand creation live in [`access`].
pub trait Container {
    /// Number of observations (rows)
    fn n_obs(&self) -> usize;

    /// Number of variables (columns)
    fn n_vars(&self) -> usize;

    fn category(&self, category: Category) -> Option<&Value>;

    fn category_mut(&mut self, category: Category) -> Option<&mut Value>;

    /// Replace a whole category, returning the previous content
    fn set_category(&mut self, category: Category, value: Value) -> Option<Value>;

    /// Create an empty category so that keys can be stored below it
    ///
    /// Returns `false` when the container cannot infer a shape for it.
    fn create_category(&mut self, category: Category) -> bool {
        match category.kind() {
            CategoryKind::Mapping => {
                self.set_category(category, Value::empty_map());
                true
            }
            CategoryKind::Slot => false,
        }
    }
}

/// Concrete location of a value: a category plus nested subkeys
///
/// Empty `keys` address the whole category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttributePath {
    pub category: Category,
    pub keys: Vec<String>,
}

impl AttributePath {
    pub fn new(category: Category, keys: Vec<String>) -> Self {
        Self { category, keys }
    }

    pub fn whole(category: Category) -> Self {
        Self::new(category, Vec::new())
    }

    pub fn key(category: Category, key: impl Into<String>) -> Self {
        Self::new(category, vec![key.into()])
    }

    pub fn is_whole(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category)?;
        for key in &self.keys {
            write!(f, "['{}']", key)?;
        }
        Ok(())
    }
}

/// Check a matrix about to be stored at `path` against the container's dimensions
///
/// Only per-observation and per-variable matrices are constrained.
pub fn check_shape(
    container: &dyn Container,
    path: &AttributePath,
    value: &Value,
) -> Result<(), CacheError> {
    let Value::Matrix(matrix) = value else {
        return Ok(());
    };

    let (rows, cols) = match (path.category, path.keys.len()) {
        (Category::X, 0) | (Category::Layers, 1) => (container.n_obs(), Some(container.n_vars())),
        (Category::Obsm, 1) => (container.n_obs(), None),
        (Category::Varm, 1) => (container.n_vars(), None),
        _ => return Ok(()),
    };

    if matrix.rows == rows && cols.map_or(true, |cols| matrix.cols == cols) {
        return Ok(());
    }

    Err(CacheError::ShapeMismatch {
        path: path.to_string(),
        expected: match cols {
            Some(cols) => format!("{}x{}", rows, cols),
            None => format!("{} rows", rows),
        },
        found: format!("{}x{}", matrix.rows, matrix.cols),
    })
}
