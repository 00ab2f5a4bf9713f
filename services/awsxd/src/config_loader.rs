//! Configuration loader for awsxd
//!
//! Loads and validates the YAML config file (database, sink, logging and
//! metrics settings). Command-line options are merged on top in
//! [`crate::config::AwsxdConfig::resolve`].
//!
//! Supports environment variable substitution using ${VAR} syntax.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use storage::DatabaseSettings;

// ============================================================================
// File Configuration (awsxd.yaml)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub database: DatabaseSettings,
    pub sinks: SinkSettings,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SinkSettings {
    /// Upper bound on any single sink call.
    pub timeout_secs: u64,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: 9464,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the config file, or `None` when it does not exist.
pub fn load_file_config<P: AsRef<Path>>(path: P) -> Result<Option<FileConfig>> {
    let content = match fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to read config from {:?}", path.as_ref()))
        }
    };

    parse_file_config(&content)
        .with_context(|| format!("Invalid config file {:?}", path.as_ref()))
        .map(Some)
}

/// Parse YAML config content after environment expansion.
pub fn parse_file_config(content: &str) -> Result<FileConfig> {
    let expanded = expand_env_vars(content)?;

    // An empty or comment-only file is valid and means "all defaults".
    let config: FileConfig = if expanded.trim().is_empty() {
        FileConfig::default()
    } else {
        serde_yaml::from_str(&expanded).context("Failed to parse config YAML")?
    };

    validate_file_config(&config)?;

    Ok(config)
}

// ============================================================================
// Environment Variable Expansion
// ============================================================================

/// Expand environment variables in YAML content
/// Supports ${VAR} and ${VAR:-default} syntax
fn expand_env_vars(content: &str) -> Result<String> {
    let mut result = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut var_expr = String::new();
            let mut brace_count = 1;

            while brace_count > 0 {
                match chars.next() {
                    Some('{') => {
                        brace_count += 1;
                        var_expr.push('{');
                    }
                    Some('}') => {
                        brace_count -= 1;
                        if brace_count > 0 {
                            var_expr.push('}');
                        }
                    }
                    Some(c) => var_expr.push(c),
                    None => anyhow::bail!("Unclosed variable substitution: ${{{}", var_expr),
                }
            }

            result.push_str(&resolve_var_expr(&var_expr)?);
        } else {
            result.push(ch);
        }
    }

    Ok(result)
}

/// Resolve variable expression (supports VAR and VAR:-default syntax)
fn resolve_var_expr(expr: &str) -> Result<String> {
    if let Some((var_name, default)) = expr.split_once(":-") {
        match std::env::var(var_name.trim()) {
            Ok(val) if !val.is_empty() => Ok(val),
            _ => Ok(default.to_string()),
        }
    } else {
        std::env::var(expr.trim()).with_context(|| format!("Environment variable {} not set", expr))
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate_file_config(config: &FileConfig) -> Result<()> {
    anyhow::ensure!(
        !config.database.host.is_empty(),
        "Database host cannot be empty"
    );
    anyhow::ensure!(
        config.database.port > 0,
        "Database port must be greater than 0"
    );
    anyhow::ensure!(
        !config.database.database.is_empty(),
        "Database name cannot be empty"
    );
    anyhow::ensure!(
        config.sinks.timeout_secs > 0,
        "sinks.timeout_secs must be greater than 0"
    );
    if config.metrics.enabled {
        anyhow::ensure!(
            config.metrics.port > 0,
            "Metrics port must be greater than 0"
        );
    }

    Ok(())
}
