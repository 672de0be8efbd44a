/// Per-kind access to container categories
///
/// Slot categories hold exactly one value; mapping categories hold a nested
/// string-keyed mapping that is created level by level on demand.
use super::{AttributePath, Category, CategoryKind, Container, Mapping, Value};
use crate::error::CacheError;

/// Capability interface over one kind of category
pub trait CategoryAccessor: Sync {
    fn exists(&self, container: &dyn Container, category: Category) -> bool {
        container.category(category).is_some()
    }

    fn get<'a>(
        &self,
        container: &'a dyn Container,
        category: Category,
        keys: &[String],
    ) -> Option<&'a Value>;

    /// Store `value`, returning the value it replaced
    fn set(
        &self,
        container: &mut dyn Container,
        category: Category,
        keys: &[String],
        value: Value,
    ) -> Result<Option<Value>, CacheError>;

    fn remove(
        &self,
        container: &mut dyn Container,
        category: Category,
        keys: &[String],
    ) -> Option<Value>;

    /// Top-level keys, empty for slots
    fn keys(&self, container: &dyn Container, category: Category) -> Vec<String>;
}

struct SlotAccessor;

struct MappingAccessor;

static SLOT: SlotAccessor = SlotAccessor;
static MAPPING: MappingAccessor = MappingAccessor;

/// Accessor matching the kind of `category`
pub fn accessor(category: Category) -> &'static dyn CategoryAccessor {
    match category.kind() {
        CategoryKind::Slot => &SLOT,
        CategoryKind::Mapping => &MAPPING,
    }
}

impl CategoryAccessor for SlotAccessor {
    fn get<'a>(
        &self,
        container: &'a dyn Container,
        category: Category,
        keys: &[String],
    ) -> Option<&'a Value> {
        if !keys.is_empty() {
            return None;
        }
        container.category(category)
    }

    fn set(
        &self,
        container: &mut dyn Container,
        category: Category,
        keys: &[String],
        value: Value,
    ) -> Result<Option<Value>, CacheError> {
        if !keys.is_empty() {
            return Err(CacheError::config(format!(
                "`{}` is a single slot and cannot hold nested keys: {}",
                category,
                AttributePath::new(category, keys.to_vec())
            )));
        }
        Ok(container.set_category(category, value))
    }

    fn remove(
        &self,
        _container: &mut dyn Container,
        _category: Category,
        _keys: &[String],
    ) -> Option<Value> {
        None
    }

    fn keys(&self, _container: &dyn Container, _category: Category) -> Vec<String> {
        Vec::new()
    }
}

impl CategoryAccessor for MappingAccessor {
    fn get<'a>(
        &self,
        container: &'a dyn Container,
        category: Category,
        keys: &[String],
    ) -> Option<&'a Value> {
        let mut current = container.category(category)?;
        for key in keys {
            current = current.as_map()?.get(key)?;
        }
        Some(current)
    }

    fn set(
        &self,
        container: &mut dyn Container,
        category: Category,
        keys: &[String],
        value: Value,
    ) -> Result<Option<Value>, CacheError> {
        let Some((last, parents)) = keys.split_last() else {
            return Ok(container.set_category(category, value));
        };

        if container.category(category).is_none() && !container.create_category(category) {
            return Err(CacheError::AttributeMissing { category });
        }

        let root = container
            .category_mut(category)
            .and_then(Value::as_map_mut)
            .ok_or_else(|| {
                CacheError::config(format!("`{}` does not hold a mapping", category))
            })?;

        let parent = descend_creating(root, category, parents)?;
        Ok(parent.insert(last.clone(), value))
    }

    fn remove(
        &self,
        container: &mut dyn Container,
        category: Category,
        keys: &[String],
    ) -> Option<Value> {
        let (last, parents) = keys.split_last()?;
        let mut current = container.category_mut(category)?.as_map_mut()?;
        for key in parents {
            current = current.get_mut(key)?.as_map_mut()?;
        }
        current.remove(last)
    }

    fn keys(&self, container: &dyn Container, category: Category) -> Vec<String> {
        container
            .category(category)
            .and_then(Value::as_map)
            .map(|map| map.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Walk `keys` below `map`, inserting empty mappings for missing levels
fn descend_creating<'a>(
    mut map: &'a mut Mapping,
    category: Category,
    keys: &[String],
) -> Result<&'a mut Mapping, CacheError> {
    for (depth, key) in keys.iter().enumerate() {
        map = map
            .entry(key.clone())
            .or_insert_with(Value::empty_map)
            .as_map_mut()
            .ok_or_else(|| {
                CacheError::config(format!(
                    "{} holds a non-mapping value",
                    AttributePath::new(category, keys[..=depth].to_vec())
                ))
            })?;
    }
    Ok(map)
}

/// Value stored at `path`, if any
pub fn get_path<'a>(container: &'a dyn Container, path: &AttributePath) -> Option<&'a Value> {
    accessor(path.category).get(container, path.category, &path.keys)
}

pub fn set_path(
    container: &mut dyn Container,
    path: &AttributePath,
    value: Value,
) -> Result<Option<Value>, CacheError> {
    accessor(path.category).set(container, path.category, &path.keys, value)
}

pub fn remove_path(container: &mut dyn Container, path: &AttributePath) -> Option<Value> {
    accessor(path.category).remove(container, path.category, &path.keys)
}

pub fn category_exists(container: &dyn Container, category: Category) -> bool {
    accessor(category).exists(container, category)
}

pub fn category_keys(container: &dyn Container, category: Category) -> Vec<String> {
    accessor(category).keys(container, category)
}
