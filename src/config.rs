use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::container::AnnotatedData;
use crate::logging::LogFormat;
use crate::resolve::HintDecl;
use crate::rule::{AttrDecls, Group, KeyDecl, RuleDecl};
use crate::storage::{default_cache_dir, expand_home, Codec};

/// Complete scache configuration (loaded from TOML file)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ScacheConfig {
    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// Additional rules, shadowing built-ins of the same name
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RuleDecl>,
}

/// Record storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory, defaults to the platform cache directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,

    /// Record codec: bincode, zstd
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Record file extension, defaults to the codec's own
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,

    /// One subdirectory per group (pp, tl, pl) instead of a shared directory
    #[serde(default = "default_true")]
    pub separate_dirs: bool,

    /// Create missing directories instead of failing
    #[serde(default = "default_true")]
    pub make_dir: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            backend: default_backend(),
            ext: None,
            separate_dirs: true,
            make_dir: true,
        }
    }
}

impl CacheConfig {
    /// Root cache directory with `~` expanded
    pub fn root_dir(&self) -> PathBuf {
        self.dir
            .as_deref()
            .map(expand_home)
            .unwrap_or_else(default_cache_dir)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json), `SCACHE_LOG_FORMAT` takes precedence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_format: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: None,
        }
    }
}

fn default_backend() -> String {
    Codec::Bincode.name().to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ScacheConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: ScacheConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Generate example configuration as TOML string
    pub fn example() -> Result<String> {
        let config = ScacheConfig {
            cache: CacheConfig {
                dir: Some("~/.cache/scache".to_string()),
                backend: Codec::Zstd.name().to_string(),
                ..Default::default()
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                log_format: Some("pretty".to_string()),
            },
            rules: vec![RuleDecl {
                name: "leiden".to_string(),
                group: Group::Tl,
                fname: Some("leiden".to_string()),
                attrs: Some(AttrDecls(vec![
                    ("obs".to_string(), KeyDecl::Literal("leiden".to_string())),
                    (
                        "uns".to_string(),
                        KeyDecl::Pattern {
                            pattern: "(.+)_colors$".to_string(),
                            group: 1,
                        },
                    ),
                ])),
                optional: vec!["uns".to_string()],
                hint: Some(HintDecl::Contains("leiden".to_string())),
                ..Default::default()
            }],
        };

        toml::to_string_pretty(&config).context("Failed to render example configuration")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        Codec::from_name(&self.cache.backend)?;

        if let Some(ext) = &self.cache.ext {
            if !ext.starts_with('.') || ext.len() < 2 {
                anyhow::bail!("cache.ext must start with a dot, e.g. \".bincode\": {}", ext);
            }
        }

        if let Some(dir) = &self.cache.dir {
            if dir.is_empty() {
                anyhow::bail!("cache.dir must not be empty when set");
            }
        }

        if !["trace", "debug", "info", "warn", "error"]
            .contains(&self.observability.log_level.as_str())
        {
            anyhow::bail!("observability.log_level must be one of: trace, debug, info, warn, error");
        }

        if let Some(format) = &self.observability.log_format {
            if LogFormat::parse(format).is_none() {
                anyhow::bail!("observability.log_format must be one of: pretty, compact, json");
            }
        }

        let mut names = BTreeSet::new();
        for decl in &self.rules {
            if !names.insert(decl.name.as_str()) {
                anyhow::bail!("rule `{}` is declared more than once", decl.name);
            }
            decl.build::<AnnotatedData>()
                .with_context(|| format!("Invalid rule `{}`", decl.name))?;
        }

        Ok(())
    }

    pub fn codec(&self) -> Result<Codec> {
        Ok(Codec::from_name(&self.cache.backend)?)
    }

    pub fn log_format(&self) -> Option<LogFormat> {
        self.observability
            .log_format
            .as_deref()
            .and_then(LogFormat::parse)
    }
}
