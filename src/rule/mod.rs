//! Cache rules
//!
//! A [`CacheRule`] binds a logical result name to the container attributes that
//! hold it, the file it is stored in and the computation that produces it.
//! Rules are built once at start-up and never change afterwards.

pub mod builtin;
pub mod decl;
pub mod registry;

pub use decl::{AttrDecls, KeyDecl, RuleDecl};
pub use registry::Registry;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::container::{AttributePath, Category, Value};
use crate::error::CacheError;
use crate::orchestrator::CallArgs;
use crate::resolve::{AliasTable, KeyHint, KeySpec};

/// Computation producing a rule's values by mutating the container it is given
///
/// A returned value is handed back to the caller of the computing call.
pub type Callback<C> =
    Arc<dyn Fn(&mut C, &CallArgs) -> anyhow::Result<Option<Value>> + Send + Sync>;

/// Functional grouping of rules, one storage directory each when separated
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Group {
    /// Preprocessing
    Pp,
    /// Tools
    #[default]
    Tl,
    /// Plots
    Pl,
}

impl Group {
    pub const ALL: [Group; 3] = [Group::Pp, Group::Tl, Group::Pl];

    pub fn name(&self) -> &'static str {
        match self {
            Group::Pp => "pp",
            Group::Tl => "tl",
            Group::Pl => "pl",
        }
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Group {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Group::ALL
            .iter()
            .copied()
            .find(|g| g.name() == s)
            .ok_or_else(|| CacheError::config(format!("Unknown group: `{}`. Use pp, tl or pl", s)))
    }
}

/// One declared attribute of a rule
#[derive(Debug, Clone)]
pub struct RuleEntry {
    /// Attribute name as declared, including any `_cacheN` suffix
    pub declared: String,
    pub category: Category,
    pub key: KeySpec,
    pub optional: bool,
}

/// Immutable description of one cached result
pub struct CacheRule<C> {
    name: String,
    group: Group,
    default_fname: String,
    entries: Vec<RuleEntry>,
    aliases: AliasTable,
    hint: Option<KeyHint>,
    default_fn: Option<Callback<C>>,
    /// Attribute handed back to the caller instead of the container
    returns: Option<AttributePath>,
    plot: bool,
}

impl<C> CacheRule<C> {
    /// Declare a rule from `(attribute, key)` pairs
    ///
    /// Attribute names may carry a `_cacheN` suffix so that one category can be
    /// listed more than once.
    pub fn from_pairs<S: AsRef<str>>(
        name: &str,
        pairs: impl IntoIterator<Item = (S, KeySpec)>,
    ) -> Result<Self, CacheError> {
        let entries = pairs
            .into_iter()
            .map(|(declared, key)| {
                let declared = declared.as_ref();
                Ok(RuleEntry {
                    declared: declared.to_string(),
                    category: Category::from_declared(declared)?,
                    key,
                    optional: false,
                })
            })
            .collect::<Result<Vec<_>, CacheError>>()?;

        Ok(Self {
            name: name.to_string(),
            group: Group::default(),
            default_fname: name.to_string(),
            entries,
            aliases: AliasTable::new(),
            hint: None,
            default_fn: None,
            returns: None,
            plot: false,
        })
    }

    /// Declare a rule from parallel attribute and key sequences
    pub fn from_parallel<S: AsRef<str>>(
        name: &str,
        attributes: Vec<S>,
        keys: Vec<KeySpec>,
    ) -> Result<Self, CacheError> {
        if attributes.len() != keys.len() {
            return Err(CacheError::config(format!(
                "Rule `{}` declares {} attributes but {} keys",
                name,
                attributes.len(),
                keys.len()
            )));
        }
        Self::from_pairs(name, attributes.into_iter().zip(keys))
    }

    pub fn with_group(mut self, group: Group) -> Self {
        self.group = group;
        self
    }

    pub fn with_fname(mut self, fname: impl Into<String>) -> Self {
        self.default_fname = fname.into();
        self
    }

    pub fn with_aliases(mut self, aliases: AliasTable) -> Self {
        self.aliases = aliases;
        self
    }

    pub fn with_hint(mut self, hint: KeyHint) -> Self {
        self.hint = Some(hint);
        self
    }

    pub fn with_default_fn(mut self, callback: Callback<C>) -> Self {
        self.default_fn = Some(callback);
        self
    }

    pub fn with_returns(mut self, path: AttributePath) -> Self {
        self.returns = Some(path);
        self
    }

    pub(crate) fn as_plot(mut self) -> Self {
        self.plot = true;
        self
    }

    /// Mark declared attributes (suffix included) as optional
    pub fn with_optional<S: AsRef<str>>(mut self, declared: &[S]) -> Result<Self, CacheError> {
        for name in declared {
            let name = name.as_ref();
            let entry = self
                .entries
                .iter_mut()
                .find(|e| e.declared == name)
                .ok_or_else(|| {
                    CacheError::config(format!(
                        "Rule `{}` has no attribute `{}` to mark optional",
                        self.name, name
                    ))
                })?;
            entry.optional = true;
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> Group {
        self.group
    }

    pub fn default_fname(&self) -> &str {
        &self.default_fname
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn hint(&self) -> Option<&KeyHint> {
        self.hint.as_ref()
    }

    pub fn default_fn(&self) -> Option<&Callback<C>> {
        self.default_fn.as_ref()
    }

    pub fn returns(&self) -> Option<&AttributePath> {
        self.returns.as_ref()
    }

    pub fn is_plot(&self) -> bool {
        self.plot
    }
}

impl<C> Clone for CacheRule<C> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            group: self.group,
            default_fname: self.default_fname.clone(),
            entries: self.entries.clone(),
            aliases: self.aliases.clone(),
            hint: self.hint.clone(),
            default_fn: self.default_fn.clone(),
            returns: self.returns.clone(),
            plot: self.plot,
        }
    }
}

impl<C> fmt::Debug for CacheRule<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheRule")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("default_fname", &self.default_fname)
            .field("entries", &self.entries)
            .field("aliases", &self.aliases)
            .field("has_default_fn", &self.default_fn.is_some())
            .field("returns", &self.returns)
            .field("plot", &self.plot)
            .finish()
    }
}
