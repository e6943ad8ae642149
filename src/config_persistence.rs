//! Loads `trackdeck.toml`, writing a default file on first run.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::config::Config;

const CONFIG_FILE_NAME: &str = "trackdeck.toml";

/// A `trackdeck.toml` in the working directory wins, so one directory per
/// deck project works without flags; otherwise the user config directory is
/// used.
pub fn config_file_path() -> PathBuf {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.exists() {
        return local;
    }
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .unwrap_or(local)
}

/// Reads the config file, creating it with defaults when absent so a first
/// run leaves an editable file behind.
pub fn load_or_create(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        let default_config = Config::default();
        let document = toml::to_string_pretty(&default_config)
            .map_err(|error| format!("failed to serialize default config: {error}"))?;
        info!(
            "config file not found; writing defaults. path={}",
            path.display()
        );
        fs::write(path, document)
            .map_err(|error| format!("failed to write {}: {error}", path.display()))?;
        return Ok(default_config);
    }

    let content = fs::read_to_string(path)
        .map_err(|error| format!("failed to read {}: {error}", path.display()))?;
    toml::from_str::<Config>(&content)
        .map_err(|error| format!("failed to parse {}: {error}", path.display()))
}
