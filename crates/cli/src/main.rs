mod cli;
mod commands;
mod hash;

use anyhow::{Context, Result};
use clap::Parser;

use callscope_core::config::{load_dotenv, Config};

use crate::cli::{CliArgs, Command};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries only the JSON result.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    load_dotenv();
    let config = Config::from_env();
    config.log_summary();

    let args = CliArgs::parse();
    let output = match &args.command {
        Command::Stats(stats) => commands::stats(stats, &config)?,
        Command::Similarities(sim) => commands::similarities(sim)?,
        Command::Lookup(lookup) => commands::lookup(lookup, &config)?,
        Command::Hash(hash) => commands::hash(hash)?,
        Command::Convert(convert) => commands::convert(convert)?,
    };

    let text = serde_json::to_string_pretty(&output).context("failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
