//! Payments Demo
//!
//! Discovers the components under `src/` and drives them from the command line.
//!
//! # Usage
//!
//! ```bash
//! cargo run --package payments-demo -- list
//! cargo run --package payments-demo -- pay stripe ada 1250 --receipt sms
//! cargo run --package payments-demo -- publish user_signup ada
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use payments_demo::checkout::Checkout;
use roster::discovery::config::ConfigLoader;
use roster::discovery::logging;
use roster::prelude::*;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "payments-demo", about = "Component discovery demo")]
struct Cli {
    /// Configuration file (defaults to roster.toml in the working directory).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to scan instead of this crate's sources.
    #[arg(short, long)]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every registry and its keys.
    List {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Charge a customer.
    Pay {
        processor: String,
        customer: String,
        cents: u64,
        /// Notification channel for the receipt.
        #[arg(long, default_value = "email")]
        receipt: String,
    },
    /// Publish an event to every handler registered for it.
    Publish { event: String, subject: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    let config = loader.load().context("failed to load configuration")?;
    logging::init_from_config(&config.logging);

    let container = Arc::new(Container::new());
    let discovery = Discovery::from_config(container.clone(), &config);
    let root = cli.root.unwrap_or_else(payments_demo::source_root);
    let reports = discovery
        .initialize(&[root], None)
        .await
        .context("component discovery failed")?;
    for report in &reports {
        info!(
            root = ?report.root,
            discovered = report.discovered,
            loaded = report.loaded,
            components = report.components,
            "Scanned root"
        );
    }

    match cli.command {
        Command::List { json } => {
            let infos: Vec<_> = container
                .registry_names()
                .iter()
                .filter_map(|name| container.registry_info(name))
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&infos)?);
            } else {
                for info in &infos {
                    println!("{:<24} {:>3}  {}", info.name, info.size, info.keys.join(", "));
                }
                println!("{}", discovery.stats());
            }
        }
        Command::Pay {
            processor,
            customer,
            cents,
            receipt,
        } => {
            let checkout = Checkout::new(container.clone(), receipt);
            let (paid, notice) = checkout.pay(&processor, &customer, cents)?;
            println!("{paid}");
            if let Some(notice) = notice {
                println!("{notice}");
            }
        }
        Command::Publish { event, subject } => {
            let checkout = Checkout::new(container.clone(), "email");
            let reactions = checkout.publish(&event, &subject)?;
            if reactions.is_empty() {
                println!("No handlers for '{event}'");
            }
            for reaction in reactions {
                println!("{reaction}");
            }
        }
    }

    Ok(())
}
