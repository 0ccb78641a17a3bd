//! Data directory layout.
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   shutterfeed.db
//!   session.json
//!   storage/{bucket}/{path}
//! ```

use std::path::{Path, PathBuf};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SHUTTERFEED_DATA_DIR` environment variable
/// 2. `~/.shutterfeed`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("SHUTTERFEED_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".shutterfeed");
    }

    PathBuf::from(".shutterfeed")
}

/// Local backend database file.
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join("shutterfeed.db")
}

/// Where the current session is persisted between runs.
pub fn session_path(data_dir: &Path) -> PathBuf {
    data_dir.join("session.json")
}

/// Root of the local object store.
pub fn storage_root(data_dir: &Path) -> PathBuf {
    data_dir.join("storage")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let dir = Path::new("/tmp/sf");
        assert_eq!(database_path(dir), PathBuf::from("/tmp/sf/shutterfeed.db"));
        assert_eq!(session_path(dir), PathBuf::from("/tmp/sf/session.json"));
        assert_eq!(storage_root(dir), PathBuf::from("/tmp/sf/storage"));
    }

    #[test]
    fn test_resolve_data_dir_is_not_empty() {
        assert!(!resolve_data_dir().as_os_str().is_empty());
    }
}
