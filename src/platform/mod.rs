// Privacy Guard platform paths
// Config lives in the per-user config directory of each OS.
//
// Uses `cfg(target_os)` to pick the right base directory at compile time.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "privacy-guard";

/// Returns the platform-specific configuration directory.
///
/// - **Linux**: `$XDG_CONFIG_HOME/privacy-guard` or `~/.config/privacy-guard`
/// - **macOS**: `~/Library/Application Support/privacy-guard`
/// - **Windows**: `%APPDATA%/privacy-guard`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata = env::var("APPDATA").unwrap_or_else(|_| String::from("C:\\Temp"));
        PathBuf::from(appdata).join(APP_DIR)
    }
    #[cfg(target_os = "macos")]
    {
        let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(APP_DIR)
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg).join(APP_DIR)
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            PathBuf::from(home).join(".config").join(APP_DIR)
        }
    }
}
