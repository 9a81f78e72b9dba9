// repomark platform paths
// Resolves where settings and the bookmark database live on each OS.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
use linux as os;

#[cfg(target_os = "macos")]
mod macos;
#[cfg(target_os = "macos")]
use macos as os;

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
use windows as os;

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/repomark`, else `~/.config/repomark`
/// - **macOS**: `~/Library/Application Support/Repomark`
/// - **Windows**: `%APPDATA%/Repomark`
pub fn get_config_dir() -> PathBuf {
    os::get_config_dir()
}

/// Directory holding the bookmark database.
///
/// - **Linux**: `$XDG_DATA_HOME/repomark`, else `~/.local/share/repomark`
/// - **macOS**: `~/Library/Application Support/Repomark`
/// - **Windows**: `%APPDATA%/Repomark`
pub fn get_data_dir() -> PathBuf {
    os::get_data_dir()
}
