//! Config command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};

use modelsync_core::Config;

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "base_url": config.base_url,
                    "data_dir": config.data_dir,
                    "timeout_secs": config.timeout_secs,
                    "log_level": config.log_level,
                })
            );
        }
        OutputFormat::Quiet => match config.base_url {
            Some(ref url) => println!("{}", url),
            None => println!("{}", config.data_dir.display()),
        },
        OutputFormat::Human => {
            let effective_path = config_path
                .cloned()
                .unwrap_or_else(Config::config_file_path);
            let transport = if config.base_url.is_some() { "http" } else { "directory" };

            println!("Configuration:");
            println!(
                "  base_url:     {}",
                config.base_url.as_deref().unwrap_or("(not set)")
            );
            println!("  data_dir:     {}", config.data_dir.display());
            println!("  timeout_secs: {}", config.timeout_secs);
            println!(
                "  log_level:    {}",
                config.log_level.as_deref().unwrap_or("(default)")
            );
            println!();
            println!("Transport:   {}", transport);
            println!("Config file: {}", effective_path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: &str, value: &str, config_path: Option<&PathBuf>, output: &Output) -> Result<()> {
    let mut config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    config.set_value(key, value)?;

    // Save to the CLI-specified path or default
    let save_path = config_path
        .cloned()
        .unwrap_or_else(Config::config_file_path);
    config
        .save_to_path(&save_path)
        .context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
