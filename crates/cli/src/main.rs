//! Order Agent CLI
//!
//! Answers one natural-language order query:
//!
//! ```bash
//! order-agent "Show me all orders where the buyer was located in Ohio and total value was over 500"
//! ```
//!
//! The result JSON goes to stdout. Logs go to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use order_agent_common::config::{AppConfig, ObservabilityConfig};
use order_agent_common::errors::{ErrorCode, FetchError};
use order_agent_common::gateway::{create_model_client, ModelGateway};
use order_agent_common::orders_api::{HttpOrdersSource, OrdersSource, StaticOrdersSource};
use order_agent_common::{metrics, VERSION};
use order_agent_pipeline::{Pipeline, PipelineError, PipelineOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "order-agent",
    version,
    about = "Answer natural-language questions about orders",
    after_help = "Examples:\n  order-agent \"orders from Ohio over 500\"\n  order-agent --orders-file orders.txt --pretty \"all orders under 100\""
)]
struct Cli {
    /// The question, e.g. "orders from Ohio over 500"
    query: String,

    /// Configuration file (defaults to config/default, config/{APP_ENV}, config/local)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read raw order text from a file instead of the orders API
    #[arg(long, value_name = "PATH")]
    orders_file: Option<PathBuf>,

    /// Pretty-print the result JSON
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return ExitCode::from(ErrorCode::ConfigurationError.exit_code());
        }
    };

    init_tracing(&config.observability);
    metrics::register_metrics();
    info!("Starting {} v{}", config.observability.service_name, VERSION);

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling request");
            ctrl_c.cancel();
        }
    });

    match run(&cli, &config, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = format!("{:#}", e);
            error!(error = %message, "Request failed");
            eprintln!("error: {}", message);
            ExitCode::from(exit_code_for(&e))
        }
    }
}

async fn run(cli: &Cli, config: &AppConfig, cancel: CancellationToken) -> Result<()> {
    let client = create_model_client(&config.model).context("Failed to create model client")?;
    let gateway = ModelGateway::new(client, config.model_timeout()).with_cancellation(cancel);
    let source = orders_source(cli, config)?;

    let pipeline = Pipeline::new(gateway, source, PipelineOptions::from(&config.extraction))?;
    let run = pipeline.run(&cli.query).await?;

    let output = if cli.pretty {
        serde_json::to_string_pretty(&run.response)?
    } else {
        serde_json::to_string(&run.response)?
    };
    println!("{}", output);

    info!(run_id = %run.run_id, stats = ?run.stats, "Done");
    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    match &cli.config {
        Some(path) => {
            let path = path.to_string_lossy();
            AppConfig::from_file(&path).with_context(|| format!("Failed to load configuration from {}", path))
        }
        None => AppConfig::load().context("Failed to load configuration"),
    }
}

fn orders_source(cli: &Cli, config: &AppConfig) -> Result<Arc<dyn OrdersSource>> {
    let source: Arc<dyn OrdersSource> = match &cli.orders_file {
        Some(path) => Arc::new(StaticOrdersSource::from_file(path)?),
        None => Arc::new(HttpOrdersSource::new(&config.orders_api.url, config.orders_timeout())?),
    };
    Ok(source)
}

fn init_tracing(observability: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&observability.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    if observability.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Map a failure to the process exit status. Anything that is not a
/// pipeline or fetch error happened during setup.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<PipelineError>() {
        e.exit_code()
    } else if let Some(e) = err.downcast_ref::<FetchError>() {
        e.code().exit_code()
    } else if err.downcast_ref::<serde_json::Error>().is_some() {
        ErrorCode::InternalError.exit_code()
    } else {
        ErrorCode::ConfigurationError.exit_code()
    }
}
