//! devforge: AI-assisted developer tools service.
//!
//! Entry point and error handling boundary. Uses `anyhow` for
//! ergonomic error propagation and user-facing messages.

mod cli;

use devforge::config::Config;
use devforge::constants;
use devforge::env::Env;
use devforge::providers::gemini::GeminiProvider;
use devforge::recovery::{
    RecoveryPipeline, normalize_docs, normalize_issues, normalize_project,
};
use devforge::server;
use devforge::services::Services;

use std::net::SocketAddr;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cli::args::{Cli, Command, RecoverArgs, ServeArgs, Shape};

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", constants::APP_NAME)));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => run_serve(args).await,
        Command::Recover(args) => run_recover(args),
        Command::Version => run_version(),
    }
}

/// Print detailed version and build information.
fn run_version() -> Result<()> {
    use colored::Colorize;

    println!(
        "{} {}",
        constants::APP_NAME.bold(),
        constants::VERSION.green().bold()
    );
    println!("{}     {}", "target:".dimmed(), constants::TARGET);
    Ok(())
}

/// Load config, build the provider and serve until interrupted.
async fn run_serve(args: ServeArgs) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine working directory")?;
    let mut config =
        Config::load(Some(&cwd), &Env::real()).context("failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let addr: SocketAddr = config
        .server
        .bind_addr()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind_addr()))?;

    let provider = GeminiProvider::new(&config.provider)
        .context("failed to initialize the model provider")?;
    tracing::info!(
        model = %config.provider.model,
        endpoint = provider.endpoint(),
        "model provider ready"
    );

    let services =
        Services::new(Arc::new(provider), config).context("failed to initialize services")?;
    server::serve(services, addr)
        .await
        .context("HTTP server failed")
}

/// Recover a saved model response and print the normalized document.
fn run_recover(args: RecoverArgs) -> Result<()> {
    use colored::Colorize;

    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;

    let pipeline = match args.shape {
        Shape::Issues => RecoveryPipeline::issues(),
        Shape::Files => RecoveryPipeline::files(),
        Shape::Docs => RecoveryPipeline::docs(),
    };
    let recovered = pipeline.recover(&raw).map_err(|e| {
        anyhow::anyhow!("{e}\n  {} {}", "hint:".dimmed(), e.hint())
    })?;

    let normalized = match args.shape {
        Shape::Issues => serde_json::to_value(normalize_issues(&recovered.document))?,
        Shape::Files => serde_json::to_value(normalize_project(&recovered.document))?,
        Shape::Docs => serde_json::to_value(normalize_docs(&recovered.document))?,
    };

    eprintln!(
        "{} {}",
        "recovered via".dimmed(),
        recovered.strategy.to_string().green().bold()
    );
    println!("{}", serde_json::to_string_pretty(&normalized)?);
    Ok(())
}
