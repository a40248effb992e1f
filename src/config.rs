//! Configuration loading and resolution.
//!
//! Configuration merges three layers with CLI > config file > defaults
//! precedence. Files may be YAML, JSON, or TOML, discovered at default
//! locations or passed explicitly.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cli::{Args, ConfigFormat};
use crate::speedtest::DEFAULT_SPEEDTEST_COMMAND;

/// Default configuration constants.
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Feature flags
    pub enable_health: Option<bool>,

    // Speed measurement
    #[serde(alias = "speedtest-command")]
    pub speedtest_command: Option<String>,

    // Logging
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: Some(DEFAULT_PORT),
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            enable_health: Some(true),
            speedtest_command: Some(DEFAULT_SPEEDTEST_COMMAND.to_string()),
            log_level: Some("info".into()),
        }
    }
}

impl Config {
    pub fn effective_bind(&self) -> &str {
        self.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR)
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn effective_speedtest_command(&self) -> &str {
        self.speedtest_command
            .as_deref()
            .unwrap_or(DEFAULT_SPEEDTEST_COMMAND)
    }
}

/// Validates the effective config (used by --check-config and startup).
pub fn validate_effective_config(cfg: &Config) -> anyhow::Result<()> {
    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            anyhow::bail!("Invalid bind address '{bind}', expected an IP address");
        }
    }

    if cfg.effective_speedtest_command().trim().is_empty() {
        anyhow::bail!("speedtest_command must not be empty");
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// CLI values win when supplied.
pub fn resolve_config(args: &Args) -> anyhow::Result<Config> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(command) = &args.speedtest_command {
        config.speedtest_command = Some(command.clone());
    }
    if args.disable_health {
        config.enable_health = Some(false);
    }

    Ok(config)
}

/// Loads a config file from an explicit path or the default locations.
/// Absent files fall back to defaults.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => {
            let defaults = [
                "/etc/hostpulse/hostpulse.yaml",
                "/etc/hostpulse/hostpulse.yml",
                "/etc/hostpulse/hostpulse.json",
                "./hostpulse.yaml",
                "./hostpulse.yml",
                "./hostpulse.json",
            ];
            match defaults.iter().find(|p| Path::new(p).exists()) {
                Some(p) => PathBuf::from(p),
                None => return Ok(Config::default()),
            }
        }
    };

    if !path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&path)?;
    let config = parse_config(&content, path.extension().and_then(|s| s.to_str()))?;
    info!("Loaded configuration from: {}", path.display());
    Ok(config)
}

/// Parses config content by file extension; YAML is the default.
fn parse_config(content: &str, extension: Option<&str>) -> anyhow::Result<Config> {
    let config = match extension {
        Some("json") => serde_json::from_str(content)?,
        Some("toml") => toml::from_str(content)?,
        _ => serde_yaml::from_str(content)?,
    };
    Ok(config)
}

/// Renders the effective config in the requested format.
pub fn render_config(config: &Config, format: &ConfigFormat) -> anyhow::Result<String> {
    let output = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    };
    Ok(output)
}

/// Generates a config file with defaults, optionally commented.
pub fn generate_config_file(
    output: Option<PathBuf>,
    format: &ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let config = Config::default();
    let output = output.unwrap_or_else(|| PathBuf::from("hostpulse.yaml"));

    let mut content = render_config(&config, format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{content}");
    } else {
        fs::write(&output, content)?;
        println!("Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds a commented reference header to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# hostpulse Configuration
# =======================
#
# Server Configuration
# --------------------
# bind: "0.0.0.0"              # Bind IP (0.0.0.0 = all interfaces)
# port: 8080                   # HTTP port
#
# Feature Flags
# -------------
# enable_health: true          # Enable /health endpoint
#
# Speed Measurement
# -----------------
# speedtest_command: "speedtest-cli"  # External measurement tool
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_complete() {
        let config = Config::default();
        assert_eq!(config.effective_port(), DEFAULT_PORT);
        assert_eq!(config.effective_bind(), DEFAULT_BIND_ADDR);
        assert_eq!(
            config.effective_speedtest_command(),
            DEFAULT_SPEEDTEST_COMMAND
        );
        assert!(validate_effective_config(&config).is_ok());
    }

    #[test]
    fn yaml_is_the_default_format() {
        let config = parse_config("port: 9100\nbind: \"127.0.0.1\"\n", None).unwrap();
        assert_eq!(config.port, Some(9100));
        assert_eq!(config.bind.as_deref(), Some("127.0.0.1"));
    }

    #[test]
    fn json_and_toml_parse_by_extension() {
        let config = parse_config(r#"{"port": 9200}"#, Some("json")).unwrap();
        assert_eq!(config.port, Some(9200));

        let config = parse_config("port = 9300\n", Some("toml")).unwrap();
        assert_eq!(config.port, Some(9300));
    }

    #[test]
    fn invalid_bind_address_is_rejected() {
        let config = Config {
            bind: Some("not-an-ip".into()),
            ..Default::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn empty_speedtest_command_is_rejected() {
        let config = Config {
            speedtest_command: Some("  ".into()),
            ..Default::default()
        };
        assert!(validate_effective_config(&config).is_err());
    }

    #[test]
    fn render_round_trips_through_yaml() {
        let rendered = render_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let parsed = parse_config(&rendered, None).unwrap();
        assert_eq!(parsed.port, Some(DEFAULT_PORT));
    }
}
