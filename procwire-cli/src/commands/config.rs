use anyhow::{Context, Result};
use procwire_config::ProcwireConfig;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info};

use crate::cli::ConfigCommands;
use crate::load_config;

pub fn handle(command: ConfigCommands, global_config: Option<&PathBuf>) -> Result<()> {
    match command {
        ConfigCommands::Validate { config_file } => handle_config_validate(&config_file),
        ConfigCommands::Generate { output, force } => handle_config_generate(&output, force),
        ConfigCommands::Show { format } => handle_config_show(global_config, &format),
    }
}

/// Handle configuration validation
fn handle_config_validate(config_file: &PathBuf) -> Result<()> {
    info!("Validating configuration file: {:?}", config_file);

    if !config_file.exists() {
        return Err(anyhow::anyhow!(
            "Configuration file not found: {:?}",
            config_file
        ));
    }

    match load_config(Some(config_file)) {
        Ok(_) => {
            println!("Configuration file is valid");
            Ok(())
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            Err(e)
        }
    }
}

/// Handle configuration generation
fn handle_config_generate(output: &PathBuf, force: bool) -> Result<()> {
    info!("Generating configuration at: {:?}", output);

    if output.exists() && !force {
        return Err(anyhow::anyhow!(
            "Output file already exists: {:?}. Use --force to overwrite.",
            output
        ));
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create output directory")?;
        }
    }

    fs::write(output, ProcwireConfig::generate_sample())
        .context("Failed to write configuration file")?;

    println!("Configuration generated at: {:?}", output);
    println!("Validate with: procwire config validate --config-file {:?}", output);

    Ok(())
}

/// Handle configuration display
fn handle_config_show(config_file: Option<&PathBuf>, format: &str) -> Result<()> {
    let config = load_config(config_file)?;

    match format.to_lowercase().as_str() {
        "yaml" | "yml" => {
            let yaml = serde_yaml::to_string(&config).context("Failed to serialize to YAML")?;
            println!("{}", yaml);
        }
        "json" => {
            let json =
                serde_json::to_string_pretty(&config).context("Failed to serialize to JSON")?;
            println!("{}", json);
        }
        _ => {
            return Err(anyhow::anyhow!(
                "Unknown output format: {}. Valid formats: yaml, json",
                format
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_then_validate() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("nested").join("procwire.yaml");

        handle_config_generate(&output, false).unwrap();
        assert!(output.exists());
        handle_config_validate(&output).unwrap();

        // Refuses to clobber without --force
        assert!(handle_config_generate(&output, false).is_err());
        handle_config_generate(&output, true).unwrap();
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        fs::write(&path, "signals:\n  exit_code: 0\n").unwrap();

        let err = handle_config_validate(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("exit_code"));
    }

    #[test]
    fn test_show_rejects_unknown_format() {
        assert!(handle_config_show(None, "toml").is_err());
    }
}
