use anyhow::Context;
use clap::Parser;
use log::{error, info, warn};
use skywatch::config::{CollectorBackend, Config};
use skywatch::error::ConfigError;
use skywatch::pipeline::{CycleSettings, IngestionCycle};
use skywatch::registry::SignalRegistry;
use skywatch::sink::{HttpSink, LoggingSink, TelemetrySink};
use skywatch::sources::{NoaaSource, SignalSource};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// Command-line arguments for the space-weather ingestion agent
#[derive(Parser)]
#[command(
    name = "skywatch",
    about = "Space-weather telemetry agent - stability scoring and anomaly detection",
    long_about = "Samples solar wind, proton flux and the planetary K-index from NOAA, \
                  scores the stability of each signal over a rolling window, classifies \
                  threshold breaches and forwards everything to a telemetry collector."
)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Configuration file path (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(
        short,
        long,
        help = "Enable verbose logging output (sets RUST_LOG=debug)"
    )]
    verbose: bool,

    /// Run a single cycle and exit
    #[arg(long, help = "Run one ingestion cycle and exit")]
    once: bool,
}

impl Cli {
    /// Validate the CLI arguments
    ///
    /// Missing config files are allowed; they fall back to defaults at load time.
    fn validate(&self) -> Result<(), String> {
        if let Some(ref config_path) = self.config {
            if config_path.exists() {
                if !config_path.is_file() {
                    return Err(format!(
                        "Configuration path is not a file: {}",
                        config_path.display()
                    ));
                }

                if let Some(extension) = config_path.extension() {
                    if extension != "toml" {
                        warn!(
                            "Configuration file does not have .toml extension: {}",
                            config_path.display()
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

/// Load configuration from file or use defaults
///
/// A missing or unreadable file falls back to defaults with a warning; a file
/// that fails to parse or validate is reported and also replaced by defaults.
fn load_config(config_path: Option<&PathBuf>) -> Result<Config, ConfigError> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            match Config::from_file(path) {
                Ok(config) => Ok(config),
                Err(ConfigError::ReadError(e)) => {
                    warn!("Configuration file unreadable ({}), using defaults", e);
                    Ok(Config::default())
                }
                Err(e) => {
                    error!("Configuration error in '{}': {}", path.display(), e);
                    warn!("Using default configuration due to invalid config file");
                    Ok(Config::default())
                }
            }
        }
        None => {
            info!("Using default configuration");
            Ok(Config::default())
        }
    }
}

/// One NOAA source per configured signal, in configured order
fn build_sources(config: &Config) -> anyhow::Result<Vec<Arc<dyn SignalSource>>> {
    config
        .agent
        .signals
        .iter()
        .map(|&signal| {
            let source = NoaaSource::new(
                signal,
                config.sources.url_for(signal).to_string(),
                config.sources.timeout(),
            )
            .with_context(|| format!("Failed to create source for {}", signal))?;
            Ok(Arc::new(source) as Arc<dyn SignalSource>)
        })
        .collect()
}

fn build_sink(config: &Config) -> anyhow::Result<Arc<dyn TelemetrySink>> {
    match config.collector.backend {
        CollectorBackend::Http => {
            let sink = HttpSink::new(
                config.collector.endpoint.clone(),
                config.collector_timeout(),
            )
            .context("Failed to create collector sink")?;
            Ok(Arc::new(sink))
        }
        CollectorBackend::Mock => {
            warn!("Collector backend is 'mock': records are logged, not delivered");
            Ok(Arc::new(LoggingSink::new()))
        }
    }
}

fn build_cycle(config: &Config) -> anyhow::Result<IngestionCycle> {
    let sources = build_sources(config)?;
    let sink = build_sink(config)?;
    let registry = SignalRegistry::new(
        config.agent.signals.iter().copied(),
        config.agent.window_capacity,
    );
    let settings = CycleSettings {
        poll_interval: config.poll_interval(),
        model_version: config.agent.model_version.clone(),
        source_tag: config.agent.source_tag.clone(),
    };

    Ok(IngestionCycle::new(
        sources,
        sink,
        registry,
        config.classifier(),
        settings,
    ))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    cli.validate().map_err(anyhow::Error::msg)?;

    let config = load_config(cli.config.as_ref()).context("Failed to load configuration")?;

    info!(
        "   Collector: {} ({:?})",
        config.collector.endpoint, config.collector.backend
    );
    info!("   Interval : every {}s", config.agent.poll_interval_seconds);
    info!("   Window   : {} readings", config.agent.window_capacity);

    let mut cycle = build_cycle(&config)?;

    if cli.once {
        let report = cycle.run_tick().await;
        info!(
            "Single cycle finished: {} anomalies, {} publish failures",
            report.published_anomalies().len(),
            report.failures().len()
        );
        return Ok(());
    }

    // Ctrl-C stops the loop between cycles
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    ctrlc::set_handler(move || {
        info!("Received interrupt signal (SIGINT), shutting down gracefully...");
        if let Err(e) = shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
    })
    .context("Error setting SIGINT handler for graceful shutdown")?;

    info!("Agent is running. Press Ctrl+C to stop.");
    cycle.run(shutdown_rx).await;

    info!("Agent shutdown complete ({})", cycle.stats().summary());
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    info!("Starting space-weather ingestion agent");

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
