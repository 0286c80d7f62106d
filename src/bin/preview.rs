//! Preview binary - dispatches one message and prints the report, no server
//!
//! Usage:
//!   cargo run --bin preview -- "Flood warning" hi ta
//!   cargo run --bin preview -- --urgent --seed 7 "Evacuate now" Hindi bn
//!
//! Flags:
//! - --urgent         format deliveries as emergency notices
//! - --seed <n>       seed the simulated provider (defaults to SIMULATION_SEED or entropy)
//! - --source <lang>  declare the source language instead of detecting it
//! - --history        also print the ledger records
//!
//! Retry settings come from the same environment variables as the server.

use anyhow::{bail, Context, Result};
use lingua_dispatch::{
    config::{Config, ProviderKind},
    dispatch::{DispatchOptions, NotificationDispatcher, Priority},
    i18n::LanguageCatalog,
    ledger::DeliveryLedger,
    translation::SimulatedProvider,
};
use std::sync::Arc;
use tracing::info;

struct PreviewArgs {
    message: String,
    targets: Vec<String>,
    urgent: bool,
    seed: Option<u64>,
    source: Option<String>,
    history: bool,
}

fn parse_args(args: &[String]) -> Result<PreviewArgs> {
    let mut urgent = false;
    let mut history = false;
    let mut seed = None;
    let mut source = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--urgent" => urgent = true,
            "--history" => history = true,
            "--seed" => {
                let value = iter.next().context("--seed needs a value")?;
                seed = Some(value.parse().context("--seed must be a number")?);
            }
            "--source" => {
                source = Some(iter.next().context("--source needs a value")?.clone());
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let Some(message) = positional.next() else {
        bail!("Usage: preview [--urgent] [--seed N] [--source LANG] [--history] <message> <target>...");
    };

    Ok(PreviewArgs {
        message,
        targets: positional.collect(),
        urgent,
        seed,
        source,
        history,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lingua_dispatch=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&args)?;
    let config = Config::from_env()?;

    let seed = args.seed.or(match config.provider {
        ProviderKind::Simulated { seed, .. } => seed,
        ProviderKind::Remote { .. } => None,
    });
    let catalog = Arc::new(LanguageCatalog::global().clone());
    let provider = match seed {
        Some(seed) => SimulatedProvider::new(seed),
        None => SimulatedProvider::from_entropy(),
    }
    .with_catalog(catalog.clone());

    let dispatcher = NotificationDispatcher::new(
        catalog.clone(),
        Arc::new(provider),
        Arc::new(DeliveryLedger::in_memory()),
    );

    let mut options: DispatchOptions = config.dispatch_options();
    if args.urgent {
        options = options.with_priority(Priority::Urgent);
    }
    if let Some(source) = &args.source {
        options = options.with_source(catalog.resolve(source)?);
    }

    info!(
        "Previewing dispatch of {} characters to {} targets",
        args.message.chars().count(),
        args.targets.len()
    );
    let report = dispatcher
        .dispatch_codes(&args.message, args.targets.as_slice(), &options)
        .await?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if args.history {
        let records = dispatcher.ledger().history(report.job_id);
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    Ok(())
}
