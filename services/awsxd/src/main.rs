//! AWS-X weather station daemon.
//!
//! Listens for `$DPTAW` sentences over UDP and stores, replicates and
//! announces every valid observation.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use awsxd::config::{expand_path, AwsxdConfig, CliOptions, DEFAULT_HOST, DEFAULT_PORT};
use awsxd::config_loader::{load_file_config, LogFormat};
use awsxd::metrics::install_exporter;
use awsxd::{ObservationPipeline, UdpListener};

#[derive(Parser, Debug)]
#[command(name = "awsxd")]
#[command(about = "AWS-X GSM weather station daemon")]
struct Args {
    /// UDP port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address to listen on
    #[arg(short = 'H', long, default_value = DEFAULT_HOST)]
    host: String,

    /// Increase verbosity (repeatable)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Process one literal sentence and exit
    #[arg(short, long)]
    simulate: Option<String>,

    /// Program run with the station id after each observation
    #[arg(short, long)]
    callback: Option<String>,

    /// Configuration file path
    #[arg(short = 'f', long, env = "AWSXD_CONFIG", default_value = "awsxd.yaml")]
    config: String,

    /// Replicate accepted sentences to host[:port]
    #[arg(short, long)]
    replicate: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = expand_path(&args.config)?;
    let file_config = load_file_config(&config_path)?;
    let loaded = file_config.is_some();
    let file_config = file_config.unwrap_or_default();

    init_tracing(args.verbose, file_config.logging.format);

    if !loaded {
        warn!(path = %config_path.display(), "Config file not found, using defaults");
    }

    let cli = CliOptions {
        host: args.host,
        port: args.port,
        verbosity: args.verbose,
        callback: args.callback,
        replicate: args.replicate,
    };
    let config = AwsxdConfig::resolve(cli, file_config)?;

    info!(
        database = %format!("{}:{}/{}", config.database.host, config.database.port, config.database.database),
        replication = ?config.replication.as_ref().map(|t| t.to_string()),
        callback = ?config.callback,
        "Loaded configuration"
    );

    if config.metrics.enabled {
        let addr = install_exporter(config.metrics.port)?;
        info!(%addr, "Prometheus metrics exporter initialized");
    }

    let pipeline = Arc::new(ObservationPipeline::from_config(&config));

    if let Some(sentence) = &args.simulate {
        let result = pipeline.process(sentence, None).await;
        info!(result = ?result, "Simulated sentence processed");
        return Ok(());
    }

    let listener =
        UdpListener::bind(&config.listen_host, config.listen_port, Arc::clone(&pipeline)).await?;
    listener
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    let totals = pipeline.metrics().snapshot();
    info!(
        frames = totals.frames_received,
        rejected = totals.frames_rejected,
        observations = totals.observations,
        "Stopped"
    );

    Ok(())
}

/// `RUST_LOG` wins; otherwise `-v` count picks the level.
fn init_tracing(verbosity: u8, format: LogFormat) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    if let Err(e) = installed {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
}
