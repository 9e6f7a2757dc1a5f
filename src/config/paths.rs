//! Where the rehearsal core keeps its config and logs.
//!
//! The base directory is an environment override when one is set and
//! non-empty, otherwise the platform default from `dirs`:
//!
//! | platform | override          | default                          |
//! |----------|-------------------|----------------------------------|
//! | Windows  | `APPDATA`         | roaming config dir               |
//! | macOS    | none              | `~/Library/Application Support`  |
//! | other    | `XDG_CONFIG_HOME` | `~/.config`                      |
//!
//! Everything lives under `<base>/call-rehearsal/data`.

use std::ffi::OsString;
use std::path::PathBuf;

const APP_DIR: &str = "call-rehearsal";

#[cfg(target_os = "windows")]
const BASE_OVERRIDE_VAR: Option<&str> = Some("APPDATA");
#[cfg(target_os = "macos")]
const BASE_OVERRIDE_VAR: Option<&str> = None;
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const BASE_OVERRIDE_VAR: Option<&str> = Some("XDG_CONFIG_HOME");

pub fn get_data_dir() -> PathBuf {
    let env_override = BASE_OVERRIDE_VAR.and_then(std::env::var_os);
    resolve_base(env_override, platform_default())
        .join(APP_DIR)
        .join("data")
}

/// Directory for rolling log files.
pub fn get_log_dir() -> PathBuf {
    get_data_dir().join("logs")
}

#[cfg(target_os = "windows")]
fn platform_default() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("AppData").join("Roaming")))
}

#[cfg(target_os = "macos")]
fn platform_default() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Library").join("Application Support"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_default() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config"))
}

/// An empty override counts as unset. With nothing at all, use the working
/// directory.
fn resolve_base(env_override: Option<OsString>, fallback: Option<PathBuf>) -> PathBuf {
    env_override
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or(fallback)
        .unwrap_or_else(|| PathBuf::from("."))
}
