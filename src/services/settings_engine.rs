// repomark Settings Engine
// Manages user settings: loading, saving, updating individual values, and resetting to defaults.
// Settings are stored as a JSON file at the platform-specific config path.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

/// Environment variable holding a GitHub token.
pub const ENV_GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Environment variable overriding the directory of the bookmark database.
pub const ENV_DATA_DIR: &str = "REPOMARK_DATA_DIR";
/// Environment variable overriding the default log filter.
pub const ENV_LOG: &str = "REPOMARK_LOG";

const DATABASE_FILE: &str = "repomark.db";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine implementation that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// If `path_override` is `Some`, uses that path for the config file.
    /// Otherwise, uses the platform-specific config directory with `settings.json`.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("settings.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }

    /// Settings with environment overrides applied. Overrides are never saved.
    pub fn effective_settings(&self) -> AppSettings {
        apply_overrides(self.settings.clone(), |name| std::env::var(name).ok())
    }

    /// Where the bookmark database lives for these settings.
    pub fn database_path(&self) -> PathBuf {
        database_path_for(&self.settings, |name| std::env::var(name).ok())
    }
}

/// Applies `GITHUB_TOKEN` and `REPOMARK_LOG` on top of `settings`.
///
/// `var` looks up an environment variable; empty values are ignored.
pub fn apply_overrides(
    mut settings: AppSettings,
    var: impl Fn(&str) -> Option<String>,
) -> AppSettings {
    let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());
    if let Some(token) = var(ENV_GITHUB_TOKEN) {
        settings.github.token = Some(token);
    }
    if let Some(level) = var(ENV_LOG) {
        settings.logging.level = level;
    }
    settings
}

/// Resolves the database file: explicit setting, then `REPOMARK_DATA_DIR`,
/// then the platform data directory.
pub fn database_path_for(settings: &AppSettings, var: impl Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(path) = settings.storage.database_path.as_deref().filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    match var(ENV_DATA_DIR).filter(|d| !d.is_empty()) {
        Some(dir) => PathBuf::from(dir).join(DATABASE_FILE),
        None => platform::get_data_dir().join(DATABASE_FILE),
    }
}

fn validate(settings: &AppSettings) -> Result<(), SettingsError> {
    if settings.import.batch_size == 0 {
        return Err(SettingsError::InvalidValue(
            "import.batch_size must be at least 1".to_string(),
        ));
    }
    if settings.github.api_base_url.trim().is_empty() {
        return Err(SettingsError::InvalidValue(
            "github.api_base_url cannot be empty".to_string(),
        ));
    }
    Ok(())
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file.
    ///
    /// If the file does not exist, returns default settings.
    /// If the file exists but is malformed, returns a serialization error.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            self.settings = AppSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: AppSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings to the JSON config file.
    ///
    /// Creates parent directories if they don't exist.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Updates an individual setting by dot-notation key path and saves.
    ///
    /// # Examples
    /// - `"import.batch_size"` → updates `settings.import.batch_size`
    /// - `"github.token"` → updates `settings.github.token`
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        if key.is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }
        let parts: Vec<&str> = key.split('.').collect();

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        {
            let mut current = &mut json_value;
            for (i, part) in parts.iter().enumerate() {
                if i == parts.len() - 1 {
                    match current {
                        serde_json::Value::Object(map) => {
                            if !map.contains_key(*part) {
                                return Err(SettingsError::InvalidKey(format!(
                                    "Key '{}' not found in settings",
                                    key
                                )));
                            }
                            map.insert(part.to_string(), value.clone());
                        }
                        _ => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Cannot navigate to key '{}': intermediate value is not an object",
                                key
                            )));
                        }
                    }
                } else {
                    current = match current.get_mut(*part) {
                        Some(v) => v,
                        None => {
                            return Err(SettingsError::InvalidKey(format!(
                                "Key '{}' not found in settings",
                                key
                            )));
                        }
                    };
                }
            }
        }

        let new_settings: AppSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;

        Ok(())
    }

    /// Resets all settings to factory defaults and saves to disk.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()?;
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
