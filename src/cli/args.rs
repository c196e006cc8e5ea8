//! Clap argument types.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Architecture generator, code reviewer and docs generator backed by a
/// hosted model.
#[derive(Parser, Debug)]
#[command(name = "devforge", version = devforge::constants::VERSION)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve(ServeArgs),

    /// Run the response recovery pipeline on a saved model response.
    Recover(RecoverArgs),

    /// Print version and build information.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind (overrides config and DEVFORGE_HOST).
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides config and DEVFORGE_PORT).
    #[arg(long)]
    pub port: Option<u16>,
}

/// Arguments for the `recover` subcommand.
#[derive(Parser, Debug)]
pub struct RecoverArgs {
    /// File holding the raw model text.
    pub file: PathBuf,

    /// Document shape the text should hold.
    #[arg(long, value_enum, default_value_t = Shape::Issues)]
    pub shape: Shape,
}

/// Document shapes known to the recovery pipeline.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Issues,
    Files,
    Docs,
}
