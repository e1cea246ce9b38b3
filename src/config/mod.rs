use crate::resources::{MissingListPolicy, ResourceLoader};
use crate::scanners::ScanOptions;
use crate::utils::error::{ArgusError, ArgusResult};
use serde::{Deserialize, Serialize};
use std::fs::{create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgusConfig {
    pub user_agent: String,
    pub timeout: u64,
    pub concurrency: usize,
    pub resources_dir: Option<PathBuf>,
    pub missing_list_policy: MissingListPolicy,
    pub scans_dir: PathBuf,
}

impl Default for ArgusConfig {
    fn default() -> Self {
        ArgusConfig {
            user_agent: "argus-scan/0.1.0".to_string(),
            timeout: 5,
            concurrency: 10,
            resources_dir: None,
            missing_list_policy: MissingListPolicy::Degrade,
            scans_dir: PathBuf::from("./scans"),
        }
    }
}

impl ArgusConfig {
    /// Scan tuning derived from this configuration.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            concurrency: self.concurrency,
            timeout: Duration::from_secs(self.timeout),
            parameter: None,
        }
    }

    /// Resource loader derived from this configuration: a configured
    /// directory with the configured policy, or the embedded lists.
    pub fn resource_loader(&self) -> ResourceLoader {
        match &self.resources_dir {
            Some(dir) => ResourceLoader::from_dir(dir, self.missing_list_policy),
            None => ResourceLoader::embedded().with_policy(self.missing_list_policy),
        }
    }
}

fn config_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/argus/config.json")];
    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("argus").join("config.json"));
    }
    paths.push(PathBuf::from("./argus.json"));
    paths
}

pub fn load_config() -> ArgusResult<ArgusConfig> {
    for path in config_paths() {
        if path.exists() {
            return load_config_from_file(&path);
        }
    }

    Ok(ArgusConfig::default())
}

fn load_config_from_file(path: &Path) -> ArgusResult<ArgusConfig> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let config: ArgusConfig = serde_json::from_str(&contents)
        .map_err(|e| ArgusError::ConfigError(format!("Failed to parse config: {}", e)))?;

    Ok(config)
}

pub fn save_config(config: &ArgusConfig, path: &Path) -> ArgusResult<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| ArgusError::ConfigError(format!("Failed to serialize config: {}", e)))?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(())
}

/// Show the current configuration
pub fn show_config(verbose: bool) -> ArgusResult<()> {
    use colored::*;

    let config = load_config()?;

    println!("{}", "=== Argus Configuration ===".bright_cyan());
    println!("User Agent: {}", config.user_agent.bright_white());
    println!(
        "Timeout: {} seconds",
        config.timeout.to_string().bright_white()
    );
    println!(
        "Concurrency: {}",
        config.concurrency.to_string().bright_white()
    );
    match &config.resources_dir {
        Some(dir) => println!(
            "Resources Directory: {}",
            dir.display().to_string().bright_white()
        ),
        None => println!("Resources Directory: {}", "embedded lists".bright_white()),
    }
    println!(
        "Missing List Policy: {:?}",
        config.missing_list_policy
    );
    println!(
        "Scans Directory: {}",
        config.scans_dir.display().to_string().bright_white()
    );

    if verbose {
        println!("\n{}", "Configuration Paths:".bright_yellow());
        for path in config_paths() {
            println!("  {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_engine_defaults() {
        let config = ArgusConfig::default();
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout, 5);
        assert_eq!(config.missing_list_policy, MissingListPolicy::Degrade);
        assert!(config.resources_dir.is_none());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ArgusConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: ArgusConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.concurrency, config.concurrency);
        assert_eq!(parsed.user_agent, config.user_agent);
    }

    #[test]
    fn scan_options_carry_timeout_and_concurrency() {
        let mut config = ArgusConfig::default();
        config.concurrency = 25;
        config.timeout = 2;
        let options = config.scan_options();
        assert_eq!(options.concurrency, 25);
        assert_eq!(options.timeout, Duration::from_secs(2));
    }
}
