//! Per-user directories for capi (XDG on Linux, platform equivalents elsewhere).

use anyhow::{Context, Result};
use std::path::PathBuf;

const APP_NAME: &str = "capi";

fn app_dir(base: Option<PathBuf>, kind: &str) -> Result<PathBuf> {
    base.map(|p| p.join(APP_NAME))
        .with_context(|| format!("Failed to determine {} directory", kind))
}

/// `$XDG_CONFIG_HOME/capi`: config.toml, user themes, keywords.json.
pub fn get_config_dir() -> Result<PathBuf> {
    app_dir(dirs::config_dir(), "config")
}

/// `$XDG_DATA_HOME/capi`: session file.
pub fn get_data_dir() -> Result<PathBuf> {
    app_dir(dirs::data_dir(), "data")
}

/// `$XDG_CACHE_HOME/capi`: log file.
pub fn get_cache_dir() -> Result<PathBuf> {
    app_dir(dirs::cache_dir(), "cache")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_dir_appends_name() {
        let dir = app_dir(Some(PathBuf::from("/tmp/base")), "config").unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/base/capi"));
    }

    #[test]
    fn missing_base_is_an_error() {
        let err = app_dir(None, "data").unwrap_err();
        assert!(err.to_string().contains("data directory"));
    }
}
