// Library interface for scache
// The `scache` binary and integration tests use these modules

pub mod cli;
pub mod cli_utils;
pub mod commands;
pub mod config;
pub mod config_discovery;
pub mod container;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod resolve;
pub mod rule;
pub mod storage;

// Re-export commonly used types
pub use config::ScacheConfig;
pub use container::{AnnotatedData, AttributePath, Category, Container, Value};
pub use error::CacheError;
pub use orchestrator::{run, Cache, CallArgs, CallOptions, Outcome};
pub use resolve::{KeyHint, KeySpec};
pub use rule::{CacheRule, Group, Registry};
pub use storage::{default_cache_dir, Codec, FilesystemStorage, Storage};
