//! Configuration and spec directory paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/testrig/`
//! - macOS: `~/Library/Application Support/testrig/`
//! - Windows: `%APPDATA%\testrig\`

use std::io;
use std::path::PathBuf;

const APP_NAME: &str = "testrig";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Default directory searched for test/suite spec files
pub fn default_specs_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().join("tests"))
}

/// Ensure a directory exists, creating it if needed
pub fn ensure_dir(dir: &std::path::Path) -> io::Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }

    #[test]
    fn test_config_path_ends_with_toml() {
        let path = config_path().unwrap();
        assert_eq!(path.extension().unwrap(), "toml");
    }
}
