/// Declarative rule definitions, as written in `scache.toml`
///
/// ```toml
/// [[rules]]
/// name = "velocity_graph"
/// group = "tl"
/// fname = "velo_graph"
/// attrs = { uns = { pattern = "(.+)_graph$" }, uns_cache1 = { pattern = "(.+)_graph_neg$" } }
/// optional = ["uns_cache1"]
/// ```
///
/// `attrs` entries are kept in the order they are written, which is the order
/// values are stored in the record file.
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

use super::{CacheRule, Group};
use crate::container::{AttributePath, Category};
use crate::error::CacheError;
use crate::resolve::{AliasTable, HintDecl, KeyHint, KeyPattern, KeySpec};

/// Serialized key specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyDecl {
    Literal(String),
    Path(Vec<String>),
    Pattern {
        pattern: String,
        #[serde(default = "default_capture_group")]
        group: usize,
    },
    Whole {
        whole: bool,
    },
}

fn default_capture_group() -> usize {
    1
}

impl TryFrom<&KeyDecl> for KeySpec {
    type Error = CacheError;

    fn try_from(decl: &KeyDecl) -> Result<Self, Self::Error> {
        match decl {
            KeyDecl::Literal(name) => Ok(KeySpec::Literal(name.clone())),
            KeyDecl::Path(names) if names.is_empty() => {
                Err(CacheError::config("Key path must not be empty"))
            }
            KeyDecl::Path(names) => Ok(KeySpec::Path(names.clone())),
            KeyDecl::Pattern { pattern, group } => {
                Ok(KeySpec::Pattern(KeyPattern::new(pattern, *group)?))
            }
            KeyDecl::Whole { whole: true } => Ok(KeySpec::Whole),
            KeyDecl::Whole { whole: false } => Err(CacheError::config(
                "`whole = false` is not a key; name the key instead",
            )),
        }
    }
}

/// `attribute = key` table in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrDecls(pub Vec<(String, KeyDecl)>);

impl AttrDecls {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, KeyDecl)> for AttrDecls {
    fn from_iter<I: IntoIterator<Item = (S, KeyDecl)>>(iter: I) -> Self {
        AttrDecls(iter.into_iter().map(|(attr, key)| (attr.into(), key)).collect())
    }
}

impl Serialize for AttrDecls {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (attr, key) in &self.0 {
            map.serialize_entry(attr, key)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttrDecls {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AttrVisitor;

        impl<'de> Visitor<'de> for AttrVisitor {
            type Value = AttrDecls;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table of `attribute = key` entries")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AttrDecls, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = access.next_entry::<String, KeyDecl>()? {
                    entries.push(entry);
                }
                Ok(AttrDecls(entries))
            }
        }

        deserializer.deserialize_map(AttrVisitor)
    }
}

/// One `[[rules]]` table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleDecl {
    pub name: String,

    #[serde(default)]
    pub group: Group,

    /// File name, defaults to the rule name
    #[serde(default)]
    pub fname: Option<String>,

    /// attribute -> key mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<AttrDecls>,

    /// Parallel to `keys`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keys: Option<Vec<KeyDecl>>,

    /// Declared attribute names (suffix included) that may be absent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<String>,

    /// Aliases ("watchers"): short name -> stored key
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub aliases: AliasTable,

    /// Default disambiguation hint for pattern keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<HintDecl>,

    /// Single attribute handed back to the caller, e.g. `{ obsm = "X_pca" }`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<AttrDecls>,
}

impl RuleDecl {
    /// Build the rule, checking the declaration's shape
    ///
    /// Exactly one of `attrs` or the `categories`/`keys` pair must be given.
    pub fn build<C>(&self) -> Result<CacheRule<C>, CacheError> {
        if self.name.is_empty() {
            return Err(CacheError::config("Rule declared without a name"));
        }

        let rule = match (&self.attrs, &self.categories, &self.keys) {
            (Some(attrs), None, None) => {
                let pairs = attrs
                    .0
                    .iter()
                    .map(|(attr, key)| Ok((attr.as_str(), KeySpec::try_from(key)?)))
                    .collect::<Result<Vec<_>, CacheError>>()?;
                CacheRule::from_pairs(&self.name, pairs)?
            }
            (None, Some(categories), Some(keys)) => {
                let keys = keys
                    .iter()
                    .map(KeySpec::try_from)
                    .collect::<Result<Vec<_>, CacheError>>()?;
                CacheRule::from_parallel(&self.name, categories.clone(), keys)?
            }
            _ => {
                return Err(CacheError::config(format!(
                    "Rule `{}`: expected either `attrs` or both `categories` and `keys`",
                    self.name
                )))
            }
        };

        let mut rule = rule
            .with_group(self.group)
            .with_fname(self.fname.clone().unwrap_or_else(|| self.name.clone()))
            .with_aliases(self.aliases.clone())
            .with_optional(self.optional.as_slice())?;

        if let Some(hint) = &self.hint {
            rule = rule.with_hint(KeyHint::try_from(hint.clone())?);
        }

        if let Some(returns) = &self.returns {
            rule = rule.with_returns(self.return_path(returns)?);
        }

        Ok(rule)
    }

    fn return_path(&self, returns: &AttrDecls) -> Result<AttributePath, CacheError> {
        let [(attr, key)] = returns.0.as_slice() else {
            return Err(CacheError::config(format!(
                "Rule `{}`: `returns` must name exactly one attribute",
                self.name
            )));
        };

        let category = Category::from_declared(attr)?;
        let keys = match key {
            KeyDecl::Literal(name) => vec![name.clone()],
            KeyDecl::Path(names) if !names.is_empty() => names.clone(),
            KeyDecl::Whole { whole: true } => Vec::new(),
            _ => {
                return Err(CacheError::config(format!(
                    "Rule `{}`: `returns` needs a literal key or key path",
                    self.name
                )))
            }
        };

        Ok(AttributePath::new(category, keys))
    }
}
