//! LeadScout CLI — decision-maker contact discovery.
//!
//! Searches the web for a company's profile and key procurement/sales
//! contacts, extracts structured records with an LLM, and caches everything
//! in a local database.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
