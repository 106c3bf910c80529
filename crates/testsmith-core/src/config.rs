//! Locations of testsmith's state and configuration files.
//!
//! ```text
//! ~/.testsmith/
//! ├── config/       # config.toml and .env.local
//! └── cache/
//!     └── previews/ # preview files written before approval
//! ```
//!
//! # Environment Variables
//!
//! - `TESTSMITH_STATE_DIR`: Override the base state directory
//! - `TESTSMITH_CONFIG_DIR`: Override the config directory
//! - `TESTSMITH_PREVIEW_DIR`: Override the preview directory

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "TESTSMITH_STATE_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "TESTSMITH_CONFIG_DIR";

/// Environment variable for custom preview directory.
pub const PREVIEW_DIR_ENV: &str = "TESTSMITH_PREVIEW_DIR";

/// Settings file looked up in the working directory before the user config.
pub const LOCAL_CONFIG_FILE: &str = "testsmith.toml";

const DEFAULT_STATE_DIR: &str = ".testsmith";
const CONFIG_SUBDIR: &str = "config";
const CACHE_SUBDIR: &str = "cache";
const PREVIEW_SUBDIR: &str = "previews";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the testsmith state directory.
///
/// 1. `TESTSMITH_STATE_DIR` if set
/// 2. `~/.testsmith` if a home directory is available
/// 3. `.testsmith` in the current directory otherwise
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the user config directory.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the user settings file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the .env.local file path (API keys, tokens).
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Get the directory preview files are written to.
pub fn preview_dir() -> PathBuf {
    std::env::var(PREVIEW_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CACHE_SUBDIR).join(PREVIEW_SUBDIR))
}
