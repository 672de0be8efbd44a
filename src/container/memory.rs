use std::collections::BTreeMap;

use super::{AttributePath, Category, CategoryKind, Container, Matrix, Value};
use crate::error::CacheError;

/// In-memory annotated data matrix
///
/// Holds `n_obs x n_vars` dimensions and one optional value per category.
/// Mapping categories start out empty, the `X` slot starts out unset.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedData {
    n_obs: usize,
    n_vars: usize,
    categories: BTreeMap<Category, Value>,
}

impl AnnotatedData {
    pub fn new(n_obs: usize, n_vars: usize) -> Self {
        let categories = Category::ALL
            .iter()
            .filter(|c| c.kind() == CategoryKind::Mapping)
            .map(|c| (*c, Value::empty_map()))
            .collect();

        Self {
            n_obs,
            n_vars,
            categories,
        }
    }

    /// Build a container around a primary matrix
    pub fn with_matrix(x: Matrix) -> Self {
        let mut data = Self::new(x.rows, x.cols);
        data.categories.insert(Category::X, Value::Matrix(x));
        data
    }

    /// Store `value` under a single top-level key of a mapping category
    pub fn insert(
        &mut self,
        category: Category,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>, CacheError> {
        super::set_path(self, &AttributePath::key(category, key), value.into())
    }

    pub fn get(&self, category: Category, keys: &[&str]) -> Option<&Value> {
        let path = AttributePath::new(category, keys.iter().map(|k| k.to_string()).collect());
        super::get_path(self, &path)
    }

    pub fn contains(&self, category: Category, keys: &[&str]) -> bool {
        self.get(category, keys).is_some()
    }

    /// Remove a whole category, as if the container never had it
    pub fn drop_category(&mut self, category: Category) -> Option<Value> {
        self.categories.remove(&category)
    }
}

impl Container for AnnotatedData {
    fn n_obs(&self) -> usize {
        self.n_obs
    }

    fn n_vars(&self) -> usize {
        self.n_vars
    }

    fn category(&self, category: Category) -> Option<&Value> {
        self.categories.get(&category)
    }

    fn category_mut(&mut self, category: Category) -> Option<&mut Value> {
        self.categories.get_mut(&category)
    }

    fn set_category(&mut self, category: Category, value: Value) -> Option<Value> {
        self.categories.insert(category, value)
    }

    fn create_category(&mut self, category: Category) -> bool {
        match category {
            // An empty primary matrix would misreport the container's shape
            Category::X => false,
            _ => {
                self.categories.insert(category, Value::empty_map());
                true
            }
        }
    }
}
