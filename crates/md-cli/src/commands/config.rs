//! Config command implementations

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use md_core::config::{self, ClientConfig};
use md_core::ConfigError;

fn resolve_path(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Load the client configuration, falling back to defaults
///
/// A missing file is not worth mentioning; an unreadable or malformed one is
/// reported as a warning so a typo never blocks the command.
pub fn load_client_config(config_path: Option<&PathBuf>) -> ClientConfig {
    let path = resolve_path(config_path);
    match config::load_config::<ClientConfig>(&path) {
        Ok(config) => {
            tracing::debug!("Loaded configuration from {:?}", path);
            config
        }
        Err(ConfigError::NotFound(_)) => ClientConfig::default(),
        Err(e) => {
            print_warning(&format!("Ignoring config {:?}: {}", path, e));
            ClientConfig::default()
        }
    }
}

/// Show the effective configuration
pub fn config_show(config_path: Option<&PathBuf>) -> Result<()> {
    let path = resolve_path(config_path);

    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Showing defaults. Run 'mirrordesk config init' to create one");
    }
    println!();

    let config = load_client_config(Some(&path));
    let rendered =
        toml::to_string_pretty(&config).context("Failed to render configuration")?;
    println!("{}", rendered);

    Ok(())
}

/// Write a default configuration file
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = resolve_path(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    write_default(&path)?;
    print_success(&format!("Created configuration file: {:?}", path));
    Ok(())
}

/// Print where the configuration is read from
pub fn config_path(config_path: Option<&PathBuf>) -> Result<()> {
    println!("{}", resolve_path(config_path).display());
    Ok(())
}

fn write_default(path: &Path) -> Result<()> {
    config::save_config(path, &ClientConfig::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))
}
