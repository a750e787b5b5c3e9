//! Application configuration.

use std::{fs, net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

/// Directory under the user's config root holding our files.
const CONFIG_DIR: &str = "theaterkasse";

/// File name of the main configuration document.
const CONFIG_FILE: &str = "config.toml";

/// Runtime configuration for the reservation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the HTTP frontend binds to.
    pub listen_addr: SocketAddr,
    /// Path of the persisted reservation ledger.
    pub data_file: PathBuf,
    /// Optional directory of static assets served at the web root.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_file: data_root().join("reservations.json"),
            static_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default file location, applying
    /// `THEATERKASSE_*` environment overrides on top.
    pub fn load() -> Result<Self> {
        Self::load_from(default_config_path())
    }

    /// Load configuration from an explicit path. A missing file falls
    /// back to the built-in defaults.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let defaults = AppConfig::default();
        let settings = Config::builder()
            .set_default("listen_addr", defaults.listen_addr.to_string())?
            .set_default("data_file", defaults.data_file.display().to_string())?
            .add_source(File::from(path.into()).required(false))
            .add_source(Environment::with_prefix("THEATERKASSE"))
            .build()
            .context("failed to assemble configuration")?;
        settings
            .try_deserialize()
            .context("failed to parse configuration")
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

fn data_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write a commented default configuration file when none exists yet.
pub fn ensure_default_config() -> Result<()> {
    let path = default_config_path();
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let defaults = AppConfig::default();
    let template = format!(
        "# Theaterkasse configuration\n\
         listen_addr = \"{}\"\n\
         data_file = \"{}\"\n\
         # static_dir = \"/var/www/theaterkasse\"\n",
        defaults.listen_addr,
        defaults.data_file.display()
    );
    fs::write(&path, template).with_context(|| format!("failed to write {}", path.display()))
}
