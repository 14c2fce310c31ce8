#![warn(clippy::pedantic)]

use anyhow::{self, Context};
use clap::{Parser, Subcommand};
use nats_provider::{KeyGenerator, KeyType, NatsProvider, NkeysGenerator};
use serde_json::json;
use tokio::io::BufReader;
use tokio::{select, signal};
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log filter, either a level (`info`, `debug`, ...) or `EnvFilter` directives.
    /// Logs are always written to stderr.
    #[arg(long = "log-level", env = "TF_LOG", default_value = "info", global = true)]
    log_level: String,

    /// Write logs as JSON
    #[arg(long = "log-json", env = "TF_LOG_JSON", global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve provider operations as newline delimited JSON over stdin/stdout (default)
    Serve,
    /// Generate a single nkey and print it as JSON
    Generate {
        /// One of user|account|server|cluster|operator|curve
        #[arg(default_value_t = KeyType::default())]
        key_type: KeyType,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    configure_logging(&args.log_level, args.log_json);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::Generate { key_type } => generate(key_type),
    }
}

/// stdout carries protocol responses, so every log line goes to stderr
fn configure_logging(log_level: &str, log_json: bool) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    if log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time())
            .init();
    }
}

async fn serve() -> anyhow::Result<()> {
    let provider = NatsProvider::default();
    select! {
        res = nats_provider_sdk::serve(
            provider,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        ) => res.context("failed to serve provider")?,
        sig = signal::ctrl_c() => {
            sig.context("failed to wait for Ctrl-C")?;
            info!("received Ctrl-C, stopping provider");
        },
    };
    Ok(())
}

fn generate(key_type: KeyType) -> anyhow::Result<()> {
    let keys = NkeysGenerator
        .generate(key_type)
        .with_context(|| format!("failed to generate {key_type} nkey"))?;
    let output = json!({
        "type": keys.key_type,
        "public_key": keys.public_key,
        "private_key": keys.private_key,
    });
    println!("{output:#}");
    Ok(())
}
