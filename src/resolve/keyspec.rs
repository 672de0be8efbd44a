use regex::Regex;
use std::fmt;

use crate::error::CacheError;

/// Declarative description of where a result lives within a category
#[derive(Debug, Clone)]
pub enum KeySpec {
    /// The whole category
    Whole,
    Literal(String),
    /// Descent through nested mappings
    Path(Vec<String>),
    Pattern(KeyPattern),
}

impl KeySpec {
    pub fn literal(name: impl Into<String>) -> Self {
        KeySpec::Literal(name.into())
    }

    pub fn path<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        KeySpec::Path(names.into_iter().map(Into::into).collect())
    }

    /// Pattern capturing the short name from group 1
    pub fn pattern(source: &str) -> Result<Self, CacheError> {
        Ok(KeySpec::Pattern(KeyPattern::new(source, 1)?))
    }
}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySpec::Whole => f.write_str("<whole>"),
            KeySpec::Literal(name) => write!(f, "'{}'", name),
            KeySpec::Path(names) => write!(f, "('{}')", names.join("', '")),
            KeySpec::Pattern(pattern) => write!(f, "re'{}'", pattern.source()),
        }
    }
}

/// Key matcher extracting a canonical short name from a capture group
///
/// Matching is anchored at the start of the key; the end is only anchored
/// when the pattern says so (`$`).
#[derive(Debug, Clone)]
pub struct KeyPattern {
    source: String,
    regex: Regex,
    group: usize,
}

impl KeyPattern {
    pub fn new(source: &str, group: usize) -> Result<Self, CacheError> {
        let regex = Regex::new(&format!("^(?:{})", source)).map_err(|e| {
            CacheError::config(format!("Invalid key pattern `{}`: {}", source, e))
        })?;

        if group == 0 || group >= regex.captures_len() {
            return Err(CacheError::config(format!(
                "Key pattern `{}` has no capture group {}",
                source, group
            )));
        }

        Ok(Self {
            source: source.to_string(),
            regex,
            group,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn group(&self) -> usize {
        self.group
    }

    /// Short name captured from `key`, if the key matches
    pub fn capture(&self, key: &str) -> Option<String> {
        self.regex
            .captures(key)
            .and_then(|caps| caps.get(self.group))
            .map(|m| m.as_str().to_string())
    }
}
