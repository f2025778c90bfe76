use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServer {
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// JSON data file, relative to the config file.
    pub store: PathBuf,
    #[serde(default)]
    pub server: ConfigServer,
}

impl Config {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let base_dir = path.parent().map(ToOwned::to_owned).unwrap_or_default();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.store = base_dir.join(&config.store);

        Ok(config)
    }

    pub fn find_and_load() -> Result<Option<Self>> {
        let config_locations = [
            Path::new("pnl-forecast.toml"),
            Path::new(".pnl-forecast.toml"),
        ];

        for location in &config_locations {
            if location.exists() {
                tracing::debug!("Using config file {}", location.display());
                return Self::load_from_file(location).map(Some);
            }
        }

        Ok(None)
    }
}
