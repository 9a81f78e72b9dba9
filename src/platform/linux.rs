// repomark paths on Linux, following the XDG base directory layout.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "repomark";

fn home() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// `$XDG_<kind>_HOME` when set and non-empty, else `~/<fallback>`.
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    match env::var(var) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => fallback.iter().fold(home(), |path, part| path.join(part)),
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).join(APP_DIR)
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"]).join(APP_DIR)
}
