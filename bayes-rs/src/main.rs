//! CLI for training and querying a bayes-rs model
//!
//! Message text is read from stdin.
//!
//! # Usage
//!
//! ```bash
//! # Train the model with a spam message
//! bayes-rs --db model.json train-spam < spam.eml
//!
//! # Train the model with a legitimate message
//! bayes-rs --db model.json train-ham < ham.eml
//!
//! # Print the spam rating of a message
//! bayes-rs --db model.json check < unknown.eml
//!
//! # Show model statistics
//! bayes-rs --db model.json stats
//! ```

use anyhow::Context;
use bayes_rs::config::LoggingConfig;
use bayes_rs::{BayesianClassifier, Config, StatisticsStore};
use clap::{Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "bayes-rs", version)]
#[command(about = "Bayesian spam rating", long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model file, overrides storage.path from the configuration
    #[arg(short, long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the model with stdin as spam
    TrainSpam,
    /// Train the model with stdin as ham
    TrainHam,
    /// Print the spam rating of stdin
    Check,
    /// Show model statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(db) = cli.db {
        config.storage.path = db;
    }
    config.validate()?;

    init_logging(&config.logging);

    let mut store = StatisticsStore::with_config(&config.storage);
    match store.load() {
        Ok(()) => {}
        Err(e) if e.is_not_found() => info!("Creating database {}", store.path().display()),
        Err(e) => {
            return Err(e).with_context(|| {
                format!("Failed to load model from {}", store.path().display())
            })
        }
    }

    let outcome = run(cli.command, &mut store, &config);
    store.finish().context("Failed to save model")?;
    outcome
}

fn run(command: Commands, store: &mut StatisticsStore, config: &Config) -> anyhow::Result<()> {
    let mut classifier = BayesianClassifier::with_config(store, config.classifier.clone());

    match command {
        Commands::TrainSpam => {
            classifier.train(&read_message()?, true)?;
            println!("Trained as spam");
        }
        Commands::TrainHam => {
            classifier.train(&read_message()?, false)?;
            println!("Trained as ham");
        }
        Commands::Check => {
            println!("{:.2}", classifier.spam_rating(&read_message()?));
        }
        Commands::Stats => {
            let stats = classifier.store().stats();
            println!("Spam messages: {}", stats.spam_messages);
            println!("Ham messages:  {}", stats.ham_messages);
            println!("Tokens:        {}", stats.token_count);
        }
    }

    Ok(())
}

fn read_message() -> anyhow::Result<String> {
    io::read_to_string(io::stdin()).context("Failed to read message from stdin")
}

fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bayes_rs={}", config.level)));
    let registry = tracing_subscriber::registry().with(filter);

    // stdout is reserved for command output
    match config.format.as_str() {
        "json" => registry
            .with(fmt::layer().json().with_writer(io::stderr))
            .init(),
        "pretty" => registry
            .with(fmt::layer().pretty().with_writer(io::stderr))
            .init(),
        _ => registry
            .with(fmt::layer().compact().with_writer(io::stderr))
            .init(),
    }
}
