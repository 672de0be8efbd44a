use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Filter cutting an ambiguous candidate set down to an explicit subset
#[derive(Debug, Clone)]
pub enum KeyHint {
    /// The whole key must match
    Pattern(Regex),
    /// Every substring must appear in the key
    AllOf(Vec<String>),
    /// The substring must appear in the key
    Contains(String),
}

impl KeyHint {
    pub fn contains(needle: impl Into<String>) -> Self {
        KeyHint::Contains(needle.into())
    }

    pub fn all_of<I, S>(needles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeyHint::AllOf(needles.into_iter().map(Into::into).collect())
    }

    pub fn pattern(source: &str) -> Result<Self, CacheError> {
        Regex::new(&format!("^(?:{})$", source))
            .map(KeyHint::Pattern)
            .map_err(|e| CacheError::config(format!("Invalid key hint `{}`: {}", source, e)))
    }

    pub fn accepts(&self, key: &str) -> bool {
        match self {
            KeyHint::Pattern(regex) => regex.is_match(key),
            KeyHint::AllOf(needles) => needles.iter().all(|n| key.contains(n.as_str())),
            KeyHint::Contains(needle) => key.contains(needle.as_str()),
        }
    }
}

/// Serialized form of a hint, as written in configuration or on the command line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HintDecl {
    Contains(String),
    AllOf(Vec<String>),
    Pattern { pattern: String },
}

impl TryFrom<HintDecl> for KeyHint {
    type Error = CacheError;

    fn try_from(decl: HintDecl) -> Result<Self, Self::Error> {
        match decl {
            HintDecl::Contains(needle) => Ok(KeyHint::Contains(needle)),
            HintDecl::AllOf(needles) => Ok(KeyHint::AllOf(needles)),
            HintDecl::Pattern { pattern } => KeyHint::pattern(&pattern),
        }
    }
}
