//! Daemon configuration.
//!
//! Command-line options and the config file are merged once at startup
//! into an immutable [`AwsxdConfig`]; nothing reads global state afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use storage::DatabaseSettings;

use crate::config_loader::{FileConfig, LoggingConfig, MetricsConfig};
use crate::pipeline::PipelineConfig;

/// Default UDP listen port.
pub const DEFAULT_PORT: u16 = 9999;

/// Default listen address.
pub const DEFAULT_HOST: &str = "localhost";

/// Options taken from the command line.
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub host: String,
    pub port: u16,
    pub verbosity: u8,
    pub callback: Option<String>,
    pub replicate: Option<String>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            verbosity: 0,
            callback: None,
            replicate: None,
        }
    }
}

/// Fully resolved daemon configuration.
#[derive(Debug, Clone)]
pub struct AwsxdConfig {
    pub listen_host: String,
    pub listen_port: u16,
    /// 0 = silent, 1 = summary, 2 = full dump.
    pub verbosity: u8,
    /// Program launched with the station id after each observation.
    pub callback: Option<PathBuf>,
    pub replication: Option<ReplicationTarget>,
    pub database: DatabaseSettings,
    pub sink_timeout: Duration,
    pub logging: LoggingConfig,
    pub metrics: MetricsConfig,
}

impl AwsxdConfig {
    /// Merge command-line options over the config file.
    pub fn resolve(cli: CliOptions, file: FileConfig) -> Result<Self> {
        let callback = match cli.callback {
            Some(raw) => {
                let path = expand_path(&raw)?;
                validate_callback(&path)?;
                Some(path)
            }
            None => None,
        };

        let replication = cli
            .replicate
            .as_deref()
            .map(|spec| ReplicationTarget::parse(spec, cli.port))
            .transpose()?;

        Ok(Self {
            listen_host: cli.host,
            listen_port: cli.port,
            verbosity: cli.verbosity,
            callback,
            replication,
            database: file.database,
            sink_timeout: Duration::from_secs(file.sinks.timeout_secs),
            logging: file.logging,
            metrics: file.metrics,
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            verbosity: self.verbosity,
            sink_timeout: self.sink_timeout,
        }
    }
}

/// `host[:port]` a copy of every accepted sentence is sent to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationTarget {
    pub host: String,
    pub port: u16,
}

impl ReplicationTarget {
    /// Parse `host` or `host:port`; a missing port falls back to `default_port`.
    pub fn parse(spec: &str, default_port: u16) -> Result<Self> {
        let parts: Vec<&str> = spec.split(':').collect();
        let (host, port) = match parts.as_slice() {
            [host] => (*host, default_port),
            [host, port] => {
                let port = port
                    .parse::<u16>()
                    .with_context(|| format!("Invalid replication port in '{}'", spec))?;
                (*host, port)
            }
            _ => bail!("Invalid replication host '{}'", spec),
        };

        if host.is_empty() {
            bail!("Invalid replication host '{}'", spec);
        }

        Ok(Self {
            host: host.to_string(),
            port,
        })
    }
}

impl fmt::Display for ReplicationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Expand `~` and `$VAR` in a user-supplied path.
pub fn expand_path(raw: &str) -> Result<PathBuf> {
    let expanded =
        shellexpand::full(raw).with_context(|| format!("Failed to expand path '{}'", raw))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// The callback must be an existing, executable file.
pub fn validate_callback(path: &Path) -> Result<()> {
    if !path.is_file() {
        bail!("No such callback file '{}'", path.display());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let mode = path
            .metadata()
            .with_context(|| format!("Failed to stat callback '{}'", path.display()))?
            .permissions()
            .mode();
        if mode & 0o111 == 0 {
            bail!(
                "Specified callback file '{}' is not an executable",
                path.display()
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_host_only_uses_default_port() {
        let target = ReplicationTarget::parse("relay.example", 9999).unwrap();
        assert_eq!(target.host, "relay.example");
        assert_eq!(target.port, 9999);
    }

    #[test]
    fn test_replication_host_and_port() {
        let target = ReplicationTarget::parse("10.0.0.7:5000", 9999).unwrap();
        assert_eq!(target.host, "10.0.0.7");
        assert_eq!(target.port, 5000);
        assert_eq!(target.to_string(), "10.0.0.7:5000");
    }

    #[test]
    fn test_replication_rejects_extra_colons() {
        assert!(ReplicationTarget::parse("a:1:2", 9999).is_err());
    }

    #[test]
    fn test_replication_rejects_bad_port() {
        assert!(ReplicationTarget::parse("relay:http", 9999).is_err());
        assert!(ReplicationTarget::parse("relay:70000", 9999).is_err());
        assert!(ReplicationTarget::parse(":5000", 9999).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let config = AwsxdConfig::resolve(CliOptions::default(), FileConfig::default()).unwrap();
        assert_eq!(config.listen_host, "localhost");
        assert_eq!(config.listen_port, 9999);
        assert!(config.callback.is_none());
        assert!(config.replication.is_none());
        assert_eq!(config.sink_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_resolve_replication_defaults_to_listen_port() {
        let cli = CliOptions {
            port: 7000,
            replicate: Some("relay".to_string()),
            ..CliOptions::default()
        };
        let config = AwsxdConfig::resolve(cli, FileConfig::default()).unwrap();
        assert_eq!(
            config.replication,
            Some(ReplicationTarget {
                host: "relay".to_string(),
                port: 7000
            })
        );
    }

    #[test]
    fn test_resolve_rejects_missing_callback() {
        let cli = CliOptions {
            callback: Some("/nonexistent/awsxd-callback".to_string()),
            ..CliOptions::default()
        };
        let err = AwsxdConfig::resolve(cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("No such callback file"));
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_callback_requires_exec_bit() {
        let dir = test_utils::scratch_dir();
        let plain = dir.path().join("plain.sh");
        std::fs::write(&plain, "#!/bin/sh\n").unwrap();
        assert!(validate_callback(&plain).is_err());

        let script = test_utils::write_script(dir.path(), "ok.sh", "exit 0");
        assert!(validate_callback(&script).is_ok());
    }

    #[test]
    fn test_pipeline_config_carries_verbosity() {
        let cli = CliOptions {
            verbosity: 2,
            ..CliOptions::default()
        };
        let config = AwsxdConfig::resolve(cli, FileConfig::default()).unwrap();
        assert_eq!(config.pipeline_config().verbosity, 2);
    }
}
