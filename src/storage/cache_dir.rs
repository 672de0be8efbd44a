use std::path::{Path, PathBuf};

/// Get default cache directory following XDG conventions
///
/// - Linux/Unix: $XDG_CACHE_HOME/scache or ~/.cache/scache
/// - macOS: ~/Library/Caches/scache
/// - Windows: %LOCALAPPDATA%/scache
pub fn default_cache_dir() -> PathBuf {
    if let Some(cache_dir) = dirs::cache_dir() {
        cache_dir.join("scache")
    } else {
        // Fallback to current directory if we can't determine cache dir
        PathBuf::from(".scache/cache")
    }
}

/// Expand a leading `~` to the home directory
pub fn expand_home(path: &str) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };

    match dirs::home_dir() {
        Some(home) => home.join(Path::new(rest.trim_start_matches(['/', '\\']))),
        None => PathBuf::from(path),
    }
}
