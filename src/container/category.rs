use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::CacheError;

/// Sub-namespace of an annotated data container
///
/// Every category except `X` is a flat mapping from string keys to values.
/// `X` is a single addressable slot holding the primary matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "X")]
    X,
    #[serde(rename = "obs")]
    Obs,
    #[serde(rename = "var")]
    Var,
    #[serde(rename = "obsm")]
    Obsm,
    #[serde(rename = "varm")]
    Varm,
    #[serde(rename = "uns")]
    Uns,
    #[serde(rename = "layers")]
    Layers,
}

/// Storage layout of a category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Slot,
    Mapping,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::X,
        Category::Obs,
        Category::Var,
        Category::Obsm,
        Category::Varm,
        Category::Uns,
        Category::Layers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::X => "X",
            Category::Obs => "obs",
            Category::Var => "var",
            Category::Obsm => "obsm",
            Category::Varm => "varm",
            Category::Uns => "uns",
            Category::Layers => "layers",
        }
    }

    pub fn kind(&self) -> CategoryKind {
        match self {
            Category::X => CategoryKind::Slot,
            _ => CategoryKind::Mapping,
        }
    }

    /// Parse a declared attribute name, stripping a `_cacheN` repetition suffix
    ///
    /// `uns_cache1` and `uns` both name [`Category::Uns`]; the suffix only exists
    /// so that one rule can declare the same category several times.
    pub fn from_declared(name: &str) -> Result<Self, CacheError> {
        strip_repeat_suffix(name).parse()
    }
}

/// Remove the `_cacheN` suffix used to repeat a category within one rule
pub fn strip_repeat_suffix(name: &str) -> &str {
    static SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix = SUFFIX.get_or_init(|| Regex::new(r"_cache\d+$").expect("valid suffix regex"));

    match suffix.find(name) {
        Some(m) => &name[..m.start()],
        None => name,
    }
}

impl FromStr for Category {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.name() == s)
            .ok_or_else(|| {
                CacheError::config(format!(
                    "Unknown attribute category: `{}`. Supported are: {}",
                    s,
                    Category::ALL.map(|c| c.name()).join(", ")
                ))
            })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
